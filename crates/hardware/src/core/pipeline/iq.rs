//! Issue queue: out-of-order wakeup and select.
//!
//! The IQ is an unordered set of bounded capacity. Entries carry their
//! operands as (physical register, value, valid) triples captured at
//! dispatch; a bus broadcast wakes every waiting entry whose source tag
//! matches. Selection is per function unit: the oldest ready entry wins,
//! with age measured by enqueue clock and ties broken by slot position.

use crate::core::pipeline::cfid::Cfid;
use crate::core::pipeline::urf::PhysReg;
use crate::isa::{FuType, Opcode};

/// One issue-queue entry.
#[derive(Clone, Copy, Debug)]
pub struct IqEntry {
    /// Program counter of the instruction.
    pub pc: u32,
    /// Operation tag.
    pub opcode: Opcode,
    /// Function unit the entry issues to.
    pub fu: FuType,
    /// Destination physical register, if the opcode writes one.
    pub dest: Option<PhysReg>,
    /// First source physical register (`None` when the opcode has no rs1).
    pub src1: Option<PhysReg>,
    /// Captured first source value.
    pub src1_value: i32,
    /// First source readiness.
    pub src1_valid: bool,
    /// Second source physical register.
    pub src2: Option<PhysReg>,
    /// Captured second source value.
    pub src2_value: i32,
    /// Second source readiness.
    pub src2_valid: bool,
    /// Literal value.
    pub imm: i32,
    /// LSQ slot for memory operations.
    pub lsq_slot: Option<usize>,
    /// ROB slot allocated at dispatch.
    pub rob_slot: usize,
    /// Guarding control-flow identifier.
    pub cfid: Option<Cfid>,
    /// Clock at which the entry was enqueued; the age for selection.
    pub enqueued_at: u64,
}

impl IqEntry {
    /// Ready when every required source is valid.
    pub fn is_ready(&self) -> bool {
        self.src1_valid && self.src2_valid
    }
}

/// Bounded unordered issue queue.
#[derive(Debug)]
pub struct IssueQueue {
    slots: Vec<Option<IqEntry>>,
}

impl IssueQueue {
    /// Creates an issue queue with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// True when no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_none())
    }

    /// True when no slot is free.
    pub fn is_full(&self) -> bool {
        self.slots.iter().all(|s| s.is_some())
    }

    /// Inserts an entry into any free slot. Returns false when full.
    pub fn enqueue(&mut self, entry: IqEntry) -> bool {
        match self.slots.iter_mut().find(|s| s.is_none()) {
            Some(slot) => {
                *slot = Some(entry);
                true
            }
            None => false,
        }
    }

    /// Removes and returns the oldest ready entry for the given function
    /// unit. Age is the enqueue clock; ties go to the lower slot index.
    pub fn select(&mut self, fu: FuType) -> Option<IqEntry> {
        let mut best: Option<(usize, u64)> = None;
        for (idx, slot) in self.slots.iter().enumerate() {
            if let Some(entry) = slot {
                if entry.fu == fu && entry.is_ready() {
                    let better = match best {
                        None => true,
                        Some((_, age)) => entry.enqueued_at < age,
                    };
                    if better {
                        best = Some((idx, entry.enqueued_at));
                    }
                }
            }
        }
        best.and_then(|(idx, _)| self.slots[idx].take())
    }

    /// Broadcast wakeup: fills every waiting source whose tag matches.
    pub fn wakeup(&mut self, phys: PhysReg, value: i32) {
        for slot in self.slots.iter_mut().flatten() {
            if !slot.src1_valid && slot.src1 == Some(phys) {
                slot.src1_value = value;
                slot.src1_valid = true;
            }
            if !slot.src2_valid && slot.src2 == Some(phys) {
                slot.src2_value = value;
                slot.src2_valid = true;
            }
        }
    }

    /// Removes every entry guarded by a squashed CFID. Returns the number
    /// of entries removed.
    pub fn flush(&mut self, squashed: &[Cfid]) -> usize {
        let mut removed = 0;
        for slot in &mut self.slots {
            let hit = slot
                .as_ref()
                .and_then(|e| e.cfid)
                .is_some_and(|c| squashed.contains(&c));
            if hit {
                *slot = None;
                removed += 1;
            }
        }
        removed
    }

    /// Retags entries inheriting a retiring branch's CFID as unguarded.
    ///
    /// Once the branch has retired its outcome is architectural, so entries
    /// that inherited its identifier are no longer speculative. Without the
    /// retag a recycled CFID could squash them from a later branch's flush.
    pub fn clear_cfid(&mut self, cfid: Cfid) {
        for slot in self.slots.iter_mut().flatten() {
            if slot.cfid == Some(cfid) {
                slot.cfid = None;
            }
        }
    }

    /// Iterates occupied entries (validation and display).
    pub fn iter(&self) -> impl Iterator<Item = &IqEntry> {
        self.slots.iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(pc: u32, fu: FuType, clock: u64) -> IqEntry {
        IqEntry {
            pc,
            opcode: Opcode::Add,
            fu,
            dest: Some(PhysReg(20)),
            src1: None,
            src1_value: 0,
            src1_valid: true,
            src2: None,
            src2_value: 0,
            src2_valid: true,
            imm: 0,
            lsq_slot: None,
            rob_slot: 0,
            cfid: None,
            enqueued_at: clock,
        }
    }

    #[test]
    fn test_capacity() {
        let mut iq = IssueQueue::new(2);
        assert!(iq.enqueue(entry(4000, FuType::Int, 0)));
        assert!(iq.enqueue(entry(4004, FuType::Int, 1)));
        assert!(iq.is_full());
        assert!(!iq.enqueue(entry(4008, FuType::Int, 2)));
    }

    #[test]
    fn test_select_oldest_ready() {
        let mut iq = IssueQueue::new(8);
        iq.enqueue(entry(4008, FuType::Int, 2));
        iq.enqueue(entry(4000, FuType::Int, 0));
        iq.enqueue(entry(4004, FuType::Int, 1));
        assert_eq!(iq.select(FuType::Int).unwrap().pc, 4000);
        assert_eq!(iq.select(FuType::Int).unwrap().pc, 4004);
    }

    #[test]
    fn test_select_skips_other_units() {
        let mut iq = IssueQueue::new(8);
        iq.enqueue(entry(4000, FuType::Mul, 0));
        assert!(iq.select(FuType::Int).is_none());
        assert_eq!(iq.select(FuType::Mul).unwrap().pc, 4000);
    }

    #[test]
    fn test_not_ready_not_selected() {
        let mut iq = IssueQueue::new(8);
        let mut e = entry(4000, FuType::Int, 0);
        e.src1 = Some(PhysReg(17));
        e.src1_valid = false;
        iq.enqueue(e);
        assert!(iq.select(FuType::Int).is_none());

        iq.wakeup(PhysReg(17), 12);
        let woken = iq.select(FuType::Int).unwrap();
        assert_eq!(woken.src1_value, 12);
    }

    #[test]
    fn test_wakeup_fills_both_sources() {
        let mut iq = IssueQueue::new(8);
        let mut e = entry(4000, FuType::Int, 0);
        e.src1 = Some(PhysReg(17));
        e.src1_valid = false;
        e.src2 = Some(PhysReg(17));
        e.src2_valid = false;
        iq.enqueue(e);
        iq.wakeup(PhysReg(17), 3);
        let woken = iq.select(FuType::Int).unwrap();
        assert_eq!((woken.src1_value, woken.src2_value), (3, 3));
    }

    #[test]
    fn test_flush_by_cfid() {
        let mut iq = IssueQueue::new(8);
        let mut guarded = entry(4004, FuType::Int, 1);
        guarded.cfid = Some(Cfid(2));
        iq.enqueue(entry(4000, FuType::Int, 0));
        iq.enqueue(guarded);
        assert_eq!(iq.flush(&[Cfid(2)]), 1);
        assert_eq!(iq.len(), 1);
        // Second flush of the same region is a no-op.
        assert_eq!(iq.flush(&[Cfid(2)]), 0);
    }

    #[test]
    fn test_clear_cfid_retags() {
        let mut iq = IssueQueue::new(8);
        let mut e = entry(4000, FuType::Int, 0);
        e.cfid = Some(Cfid(1));
        iq.enqueue(e);
        iq.clear_cfid(Cfid(1));
        assert_eq!(iq.flush(&[Cfid(1)]), 0);
        assert_eq!(iq.len(), 1);
    }
}
