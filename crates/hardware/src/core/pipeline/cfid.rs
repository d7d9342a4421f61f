//! Control-flow identifier pool and prediction table.
//!
//! Every speculative control-flow instruction (BZ, BNZ, JUMP, JAL) is tagged
//! with a CFID at decode; the instructions that follow inherit the tag until
//! the next branch. The tag is the unit of flush: squashing a branch squashes
//! every CFID born at or after it. This module provides:
//! 1. **Allocation:** A bounded pool (CFIDs are numbered `1..=size`).
//! 2. **Ordering:** The program order of in-flight CFIDs, used to compute
//!    flush sets.
//! 3. **Prediction table:** Last observed direction per CFID. Populated at
//!    resolution but never consulted by fetch — the minimal model is
//!    static-taken. Kept so a real predictor can slot in without
//!    restructuring.

use std::collections::VecDeque;
use std::fmt;

/// A control-flow identifier. Numbering is 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cfid(pub u8);

impl fmt::Display for Cfid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CF{}", self.0)
    }
}

/// One prediction table row.
#[derive(Clone, Copy, Debug)]
struct Prediction {
    pc: Option<u32>,
    /// Initially taken, matching the static-taken policy.
    taken: bool,
}

impl Default for Prediction {
    fn default() -> Self {
        Self {
            pc: None,
            taken: true,
        }
    }
}

/// Pool of control-flow identifiers with in-flight ordering.
#[derive(Debug)]
pub struct CfidPool {
    free: VecDeque<Cfid>,
    in_flight: VecDeque<Cfid>,
    last: Option<Cfid>,
    // Indexed by CFID value; row 0 is unused (1-based numbering).
    predictions: Vec<Prediction>,
}

impl CfidPool {
    /// Creates a pool of `size` identifiers, all free.
    pub fn new(size: usize) -> Self {
        Self {
            free: (1..=size).map(|i| Cfid(i as u8)).collect(),
            in_flight: VecDeque::new(),
            last: None,
            predictions: vec![Prediction::default(); size + 1],
        }
    }

    /// True when a branch could not be tagged this cycle.
    pub fn is_exhausted(&self) -> bool {
        self.free.is_empty()
    }

    /// Number of identifiers currently in flight.
    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    /// The CFID of the most recent in-flight control-flow instruction, which
    /// non-branch instructions inherit.
    pub fn current(&self) -> Option<Cfid> {
        self.last
    }

    /// Allocates the next identifier to a decoding branch and records it as
    /// the most recent control-flow instruction.
    pub fn allocate(&mut self) -> Option<Cfid> {
        let cfid = self.free.pop_front()?;
        self.in_flight.push_back(cfid);
        self.last = Some(cfid);
        Some(cfid)
    }

    /// Releases an identifier when its branch retires.
    ///
    /// Clearing `last` when the retiring branch is still the newest means
    /// later instructions are no longer tagged as control-dependent on it.
    pub fn release(&mut self, cfid: Cfid) {
        if let Some(pos) = self.in_flight.iter().position(|c| *c == cfid) {
            self.in_flight.remove(pos);
            self.free.push_back(cfid);
        }
        if self.last == Some(cfid) {
            self.last = None;
        }
    }

    /// Computes the flush set for a resolving branch: every in-flight CFID at
    /// or after `cfid` in program order.
    ///
    /// Identifiers strictly younger than the branch are squashed — returned to
    /// the free list — and the branch becomes the most recent control-flow
    /// instruction again. The branch's own identifier stays in flight until
    /// it retires.
    pub fn squash_from(&mut self, cfid: Cfid) -> Vec<Cfid> {
        let Some(pos) = self.in_flight.iter().position(|c| *c == cfid) else {
            return Vec::new();
        };
        let flushed: Vec<Cfid> = self.in_flight.iter().skip(pos).copied().collect();
        while self.in_flight.len() > pos + 1 {
            if let Some(young) = self.in_flight.pop_back() {
                self.free.push_back(young);
            }
        }
        self.last = Some(cfid);
        flushed
    }

    /// Records the resolved direction of a branch.
    pub fn record_prediction(&mut self, cfid: Cfid, pc: u32, taken: bool) {
        if let Some(row) = self.predictions.get_mut(cfid.0 as usize) {
            row.pc = Some(pc);
            row.taken = taken;
        }
    }

    /// The last recorded direction for a branch PC, if any row matches.
    pub fn last_prediction(&self, pc: u32) -> Option<bool> {
        self.predictions
            .iter()
            .find(|row| row.pc == Some(pc))
            .map(|row| row.taken)
    }
}
