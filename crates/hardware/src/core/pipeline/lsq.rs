//! Load/store queue: the in-order memory pipeline.
//!
//! Memory operations enter the LSQ at dispatch in program order and leave
//! strictly from the head. An entry is born without an address; address
//! generation on the integer unit fills it in later (for stores, together
//! with the latched data value). The queue is a ring with stable physical
//! slot indices, because issue-queue entries refer to their LSQ slot by
//! number.

use crate::core::pipeline::cfid::Cfid;
use crate::core::pipeline::urf::PhysReg;

/// Direction of a memory operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemOp {
    /// Read a word into a physical destination.
    Load,
    /// Write a source value to memory.
    Store,
}

/// One load/store queue entry.
#[derive(Clone, Copy, Debug)]
pub struct LsqEntry {
    /// Program counter of the instruction.
    pub pc: u32,
    /// LOAD or STORE.
    pub op: MemOp,
    /// Effective address, filled by address generation.
    pub address: Option<i32>,
    /// Destination physical register (LOAD).
    pub dest: Option<PhysReg>,
    /// Source physical register carrying the store data (STORE).
    pub src: Option<PhysReg>,
    /// Captured store data.
    pub src_value: i32,
    /// Store data readiness.
    pub src_valid: bool,
    /// ROB slot allocated at dispatch.
    pub rob_slot: usize,
    /// Guarding control-flow identifier.
    pub cfid: Option<Cfid>,
}

impl LsqEntry {
    /// Ready for the memory unit: address resolved and, for stores, data
    /// present.
    pub fn is_complete(&self) -> bool {
        self.address.is_some() && (self.op == MemOp::Load || self.src_valid)
    }
}

/// Ring-buffer load/store queue with stable slot indices.
#[derive(Debug)]
pub struct LoadStoreQueue {
    slots: Vec<Option<LsqEntry>>,
    head: usize,
    tail: usize,
    count: usize,
}

impl LoadStoreQueue {
    /// Creates a queue with the given capacity.
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

    /// True when the queue holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// True when the queue cannot admit another entry.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.count == self.slots.len()
    }

    fn prev(&self, idx: usize) -> usize {
        (idx + self.slots.len() - 1) % self.slots.len()
    }

    /// Appends an entry at the tail, returning its stable slot index.
    pub fn allocate(&mut self, entry: LsqEntry) -> Option<usize> {
        if self.is_full() {
            return None;
        }
        let slot = self.tail;
        self.slots[slot] = Some(entry);
        self.tail = (self.tail + 1) % self.slots.len();
        self.count += 1;
        Some(slot)
    }

    /// The head entry and its slot index.
    pub fn head(&self) -> Option<(usize, &LsqEntry)> {
        if self.count == 0 {
            None
        } else {
            self.slots[self.head].as_ref().map(|e| (self.head, e))
        }
    }

    /// Fills in the effective address (and, for stores, the latched data)
    /// computed by address generation.
    pub fn resolve(&mut self, slot: usize, address: i32, store_data: Option<(i32, bool)>) {
        if let Some(entry) = self.slots.get_mut(slot).and_then(Option::as_mut) {
            entry.address = Some(address);
            if let Some((value, valid)) = store_data {
                // A wakeup may already have supplied fresher data.
                if !entry.src_valid {
                    entry.src_value = value;
                    entry.src_valid = valid;
                }
            }
        }
    }

    /// Broadcast wakeup for stores still waiting on their data register.
    pub fn wakeup(&mut self, phys: PhysReg, value: i32) {
        for entry in self.slots.iter_mut().flatten() {
            if entry.op == MemOp::Store && !entry.src_valid && entry.src == Some(phys) {
                entry.src_value = value;
                entry.src_valid = true;
            }
        }
    }

    /// Pops the head entry.
    pub fn retire_head(&mut self) -> Option<LsqEntry> {
        if self.count == 0 {
            return None;
        }
        let entry = self.slots[self.head].take();
        self.head = (self.head + 1) % self.slots.len();
        self.count -= 1;
        entry
    }

    /// Removes every entry guarded by a squashed CFID. Squashed memory ops
    /// are always the youngest suffix of the queue, so this walks back from
    /// the tail. Returns the number removed.
    pub fn flush(&mut self, squashed: &[Cfid]) -> usize {
        let mut removed = 0;
        while self.count > 0 {
            let last = self.prev(self.tail);
            let hit = self.slots[last]
                .as_ref()
                .and_then(|e| e.cfid)
                .is_some_and(|c| squashed.contains(&c));
            if !hit {
                break;
            }
            self.slots[last] = None;
            self.tail = last;
            self.count -= 1;
            removed += 1;
        }
        removed
    }

    /// Retags entries inheriting a retiring branch's CFID as unguarded.
    pub fn clear_cfid(&mut self, cfid: Cfid) {
        for entry in self.slots.iter_mut().flatten() {
            if entry.cfid == Some(cfid) {
                entry.cfid = None;
            }
        }
    }

    /// Iterates occupied entries in arbitrary slot order (validation).
    pub fn iter(&self) -> impl Iterator<Item = &LsqEntry> {
        self.slots.iter().flatten()
    }
}
