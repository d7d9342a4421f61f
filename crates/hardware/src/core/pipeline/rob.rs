//! Reorder buffer: in-order retirement.
//!
//! The ROB is a ring buffer tracking every in-flight instruction from
//! dispatch to retirement. It provides:
//! 1. **Admission:** Entries enter at the tail in rename order.
//! 2. **Completion:** Function units mark their slot done with a result and
//!    optional zero flag.
//! 3. **In-order retirement:** The head leaves only when complete; the caller
//!    performs the B-RAT flip and CFID release.
//! 4. **Flush:** A resolving branch squashes every entry strictly newer than
//!    its own slot.
//! 5. **Flag lookup:** Branch predicates walk back from the branch slot to
//!    the nearest completed flag producer.
//!
//! Slot indices are physical ring positions and stay valid for the lifetime
//! of the entry; IQ and LSQ entries carry them for direct completion.

use crate::core::pipeline::cfid::Cfid;
use crate::core::pipeline::urf::{PhysReg, RatSnapshot};
use crate::isa::Opcode;

/// Completion state of a ROB entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RobState {
    /// Admitted, result not yet produced.
    #[default]
    Pending,
    /// Result available; eligible to retire at the head.
    Completed,
}

/// A single reorder buffer entry.
#[derive(Clone, Debug)]
pub struct RobEntry {
    /// Program counter of the instruction.
    pub pc: u32,
    /// Operation tag.
    pub opcode: Opcode,
    /// Architectural destination, if the opcode writes one.
    pub arch_rd: Option<usize>,
    /// Physical destination backing `arch_rd`.
    pub phys_rd: Option<PhysReg>,
    /// Guarding control-flow identifier (a branch's own CFID).
    pub cfid: Option<Cfid>,
    /// Completion state.
    pub state: RobState,
    /// Result value recorded at completion.
    pub result: i32,
    /// Zero flag, present only for flag-producing opcodes.
    pub zero_flag: Option<bool>,
    /// Rename snapshot taken at dispatch (control-flow instructions only).
    pub snapshot: Option<RatSnapshot>,
}

/// Ring-buffer reorder buffer.
#[derive(Debug)]
pub struct Rob {
    slots: Vec<Option<RobEntry>>,
    head: usize,
    tail: usize,
    count: usize,
}

impl Rob {
    /// Creates a ROB with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    /// Number of occupied slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    /// True when the ROB holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// True when the ROB cannot admit another entry.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.count == self.slots.len()
    }

    fn prev(&self, idx: usize) -> usize {
        (idx + self.slots.len() - 1) % self.slots.len()
    }

    /// Admits an entry at the tail, returning its stable slot index.
    pub fn admit(&mut self, entry: RobEntry) -> Option<usize> {
        if self.is_full() {
            return None;
        }
        let slot = self.tail;
        self.slots[slot] = Some(entry);
        self.tail = (self.tail + 1) % self.slots.len();
        self.count += 1;
        Some(slot)
    }

    /// The head (oldest) entry.
    pub fn peek_head(&self) -> Option<&RobEntry> {
        if self.count == 0 {
            None
        } else {
            self.slots[self.head].as_ref()
        }
    }

    /// The head's slot index.
    pub fn head_slot(&self) -> Option<usize> {
        (self.count > 0).then_some(self.head)
    }

    /// Pops the head entry. The caller decides retirement side effects.
    pub fn retire_head(&mut self) -> Option<RobEntry> {
        if self.count == 0 {
            return None;
        }
        let entry = self.slots[self.head].take();
        self.head = (self.head + 1) % self.slots.len();
        self.count -= 1;
        entry
    }

    /// Marks a slot completed with its result and optional zero flag.
    ///
    /// The PC guards against a stale completion hitting a slot that was
    /// flushed and reallocated in the meantime.
    pub fn complete(&mut self, slot: usize, pc: u32, result: i32, zero_flag: Option<bool>) {
        if let Some(entry) = self.slots.get_mut(slot).and_then(Option::as_mut) {
            if entry.pc == pc {
                entry.state = RobState::Completed;
                entry.result = result;
                entry.zero_flag = zero_flag;
            }
        }
    }

    /// Reference to an occupied slot.
    pub fn entry(&self, slot: usize) -> Option<&RobEntry> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Takes the rename snapshot out of a slot (branch resolution).
    pub fn take_snapshot(&mut self, slot: usize) -> Option<RatSnapshot> {
        self.slots
            .get_mut(slot)
            .and_then(Option::as_mut)
            .and_then(|e| e.snapshot.take())
    }

    /// Squashes every entry strictly newer than `slot`. Returns the number
    /// removed.
    pub fn flush_after(&mut self, slot: usize) -> usize {
        if self.count == 0 {
            return 0;
        }
        let mut removed = 0;
        let mut idx = self.prev(self.tail);
        while idx != slot && self.slots[idx].is_some() {
            self.slots[idx] = None;
            self.tail = idx;
            self.count -= 1;
            removed += 1;
            if self.count == 0 {
                break;
            }
            idx = self.prev(idx);
        }
        removed
    }

    /// The zero flag a branch in `slot` observes: walking backward toward
    /// the head, the nearest completed entry that produced a flag. `None`
    /// when no in-window producer exists (the caller falls back to the
    /// architectural flag).
    pub fn flag_before(&self, slot: usize) -> Option<bool> {
        if self.count == 0 || slot == self.head {
            return None;
        }
        let mut idx = self.prev(slot);
        loop {
            if let Some(entry) = &self.slots[idx] {
                if entry.state == RobState::Completed {
                    if let Some(flag) = entry.zero_flag {
                        return Some(flag);
                    }
                }
            }
            if idx == self.head {
                return None;
            }
            idx = self.prev(idx);
        }
    }

    /// Physical destinations of all surviving entries, used to rebuild the
    /// free list after a snapshot restore.
    pub fn live_dests(&self) -> Vec<PhysReg> {
        self.iter().filter_map(|e| e.phys_rd).collect()
    }

    /// Iterates occupied entries from head to tail.
    pub fn iter(&self) -> impl Iterator<Item = &RobEntry> {
        let mut order = Vec::with_capacity(self.count);
        let mut idx = self.head;
        for _ in 0..self.count {
            if let Some(entry) = &self.slots[idx] {
                order.push(entry);
            }
            idx = (idx + 1) % self.slots.len();
        }
        order.into_iter()
    }
}
