//! Unified register file, rename tables, and snapshots.
//!
//! The URF backs every architectural register with a physical one. It
//! provides:
//! 1. **Allocation:** A free list of unassigned physical registers; `allocate`
//!    clears the register's valid bit so consumers wait for the new value.
//! 2. **Rename:** The front rename table (F-RAT) read at decode, and the back
//!    rename table (B-RAT) updated at commit.
//! 3. **Snapshots:** A value copy of the F-RAT taken when a control-flow
//!    instruction dispatches, restored wholesale on a taken branch.
//! 4. **Reclamation:** Commit frees the physical register displaced from the
//!    B-RAT; restore rebuilds the free list from reachability.
//!
//! At reset the rename tables are the identity map: architectural `Ri` is
//! backed by physical `Ui`, valid, holding 0. The remaining physical
//! registers form the initial free list.

use std::collections::VecDeque;
use std::fmt;

/// Index of a physical register in the unified register file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PhysReg(pub usize);

impl fmt::Display for PhysReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U{}", self.0)
    }
}

/// One physical register: value, valid bit, zero-flag bit.
#[derive(Clone, Copy, Debug, Default)]
struct UrfEntry {
    value: i32,
    valid: bool,
    zero: bool,
}

/// Value copy of the rename state, attached to a control-flow instruction's
/// ROB entry at dispatch.
#[derive(Clone, Debug)]
pub struct RatSnapshot {
    f_rat: Vec<Option<PhysReg>>,
    free: VecDeque<PhysReg>,
}

/// The unified register file with both rename tables.
#[derive(Debug)]
pub struct Urf {
    regs: Vec<UrfEntry>,
    free: VecDeque<PhysReg>,
    f_rat: Vec<Option<PhysReg>>,
    b_rat: Vec<Option<PhysReg>>,
}

impl Urf {
    /// Creates a URF with `urf_size` physical and `arch_regs` architectural
    /// registers, rename tables at the identity map.
    pub fn new(urf_size: usize, arch_regs: usize) -> Self {
        assert!(urf_size > arch_regs, "URF must outnumber architectural registers");
        let mut regs = vec![UrfEntry::default(); urf_size];
        let mut f_rat = vec![None; arch_regs];
        let mut b_rat = vec![None; arch_regs];
        for (arch, slot) in f_rat.iter_mut().enumerate() {
            regs[arch].valid = true;
            *slot = Some(PhysReg(arch));
            b_rat[arch] = Some(PhysReg(arch));
        }
        let free = (arch_regs..urf_size).map(PhysReg).collect();
        Self {
            regs,
            free,
            f_rat,
            b_rat,
        }
    }

    /// Number of physical registers.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.regs.len()
    }

    /// Number of architectural registers.
    #[inline]
    pub fn arch_regs(&self) -> usize {
        self.f_rat.len()
    }

    /// Number of free physical registers.
    #[inline]
    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    /// True when a rename needing a destination would stall.
    #[inline]
    pub fn free_list_empty(&self) -> bool {
        self.free.is_empty()
    }

    /// Allocates a physical register and clears its valid bit.
    /// Returns `None` when the free list is empty.
    pub fn allocate(&mut self) -> Option<PhysReg> {
        let phys = self.free.pop_front()?;
        self.regs[phys.0] = UrfEntry {
            value: 0,
            valid: false,
            zero: false,
        };
        Some(phys)
    }

    /// Renames an architectural destination: allocates a physical register
    /// and points the F-RAT at it.
    pub fn rename_write(&mut self, rd: usize) -> Option<PhysReg> {
        let phys = self.allocate()?;
        self.f_rat[rd] = Some(phys);
        Some(phys)
    }

    /// Current F-RAT mapping for an architectural source.
    pub fn rename_read(&self, rs: usize) -> Option<PhysReg> {
        self.f_rat[rs]
    }

    /// The committed (B-RAT) mapping for an architectural register.
    pub fn committed_mapping(&self, arch: usize) -> Option<PhysReg> {
        self.b_rat[arch]
    }

    /// Writes a produced value into a physical register, setting its valid
    /// and zero-flag bits.
    pub fn write(&mut self, phys: PhysReg, value: i32) {
        self.regs[phys.0] = UrfEntry {
            value,
            valid: true,
            zero: value == 0,
        };
    }

    /// The value of a physical register, if produced.
    pub fn value_of(&self, phys: PhysReg) -> Option<i32> {
        let entry = self.regs[phys.0];
        entry.valid.then_some(entry.value)
    }

    /// Whether a physical register currently holds a produced value.
    pub fn is_valid(&self, phys: PhysReg) -> bool {
        self.regs[phys.0].valid
    }

    /// The zero-flag bit of a physical register.
    pub fn zero_of(&self, phys: PhysReg) -> bool {
        self.regs[phys.0].zero
    }

    /// Commits a retiring write: flips the B-RAT to `phys` and frees the
    /// physical register it displaces.
    pub fn commit(&mut self, arch: usize, phys: PhysReg) {
        if let Some(old) = self.b_rat[arch] {
            if old != phys {
                self.free.push_back(old);
            }
        }
        self.b_rat[arch] = Some(phys);
    }

    /// Takes a value copy of the rename state.
    pub fn snapshot(&self) -> RatSnapshot {
        RatSnapshot {
            f_rat: self.f_rat.clone(),
            free: self.free.clone(),
        }
    }

    /// Restores the F-RAT from a snapshot and rebuilds the free list.
    ///
    /// The free list is not taken from the snapshot verbatim: commits that
    /// happened between snapshot and restore have already recycled registers
    /// the snapshot believed live. Instead, every physical register not
    /// reachable from the restored F-RAT, the B-RAT, or a surviving in-flight
    /// destination becomes free.
    pub fn restore(&mut self, snapshot: &RatSnapshot, live_dests: &[PhysReg]) {
        self.f_rat.clone_from(&snapshot.f_rat);

        let mut reachable = vec![false; self.regs.len()];
        for mapping in self.f_rat.iter().chain(self.b_rat.iter()) {
            if let Some(phys) = mapping {
                reachable[phys.0] = true;
            }
        }
        for phys in live_dests {
            reachable[phys.0] = true;
        }

        self.free.clear();
        for (idx, live) in reachable.iter().enumerate() {
            if !live {
                self.free.push_back(PhysReg(idx));
            }
        }
    }

    /// Iterates the free list (validation and display).
    pub fn iter_free(&self) -> impl Iterator<Item = PhysReg> + '_ {
        self.free.iter().copied()
    }

    /// Iterates `(physical, value, valid)` for the state dump.
    pub fn iter_regs(&self) -> impl Iterator<Item = (PhysReg, i32, bool)> + '_ {
        self.regs
            .iter()
            .enumerate()
            .map(|(idx, e)| (PhysReg(idx), e.value, e.valid))
    }

    /// Iterates the F-RAT as `(arch, mapping)`.
    pub fn iter_f_rat(&self) -> impl Iterator<Item = (usize, Option<PhysReg>)> + '_ {
        self.f_rat.iter().copied().enumerate()
    }

    /// Iterates the B-RAT as `(arch, mapping)`.
    pub fn iter_b_rat(&self) -> impl Iterator<Item = (usize, Option<PhysReg>)> + '_ {
        self.b_rat.iter().copied().enumerate()
    }

    /// The architectural value of a register as seen after all retired
    /// writes, resolved through the B-RAT.
    pub fn architectural_value(&self, arch: usize) -> Option<i32> {
        self.b_rat[arch].and_then(|p| self.value_of(p))
    }
}
