//! Simulation statistics collection and reporting.
//!
//! This module tracks performance metrics for the APEX simulator:
//! 1. **Cycle and IPC:** Total cycles, retired instructions, derived IPC.
//! 2. **Instruction mix:** Counts by category (ALU, MUL, load, store, branch).
//! 3. **Speculation:** Resolved-taken branches and entries squashed by flushes.
//! 4. **Stalls:** Rename and dispatch structural stall cycles.

use std::time::Instant;

/// Simulation statistics tracking all performance metrics.
#[derive(Clone, Debug)]
pub struct SimStats {
    start_time: Instant,
    /// Total simulator cycles elapsed.
    pub cycles: u64,
    /// Number of instructions committed (retired), including memory ops.
    pub instructions_retired: u64,

    /// Count of ALU (arithmetic/logical/MOVC/JAL) instructions retired.
    pub inst_alu: u64,
    /// Count of multiply instructions retired.
    pub inst_mul: u64,
    /// Count of load instructions retired.
    pub inst_load: u64,
    /// Count of store instructions retired.
    pub inst_store: u64,
    /// Count of control-flow instructions retired.
    pub inst_branch: u64,

    /// Branches resolved taken (each one costs a flush and restore).
    pub branches_taken: u64,
    /// ROB entries squashed by control-flow flushes.
    pub entries_squashed: u64,

    /// Cycles the decode stage stalled on rename resources (free list, CFIDs).
    pub stalls_rename: u64,
    /// Cycles the dispatch stage stalled on a full IQ, ROB, or LSQ.
    pub stalls_dispatch: u64,
}

impl Default for SimStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            cycles: 0,
            instructions_retired: 0,
            inst_alu: 0,
            inst_mul: 0,
            inst_load: 0,
            inst_store: 0,
            inst_branch: 0,
            branches_taken: 0,
            entries_squashed: 0,
            stalls_rename: 0,
            stalls_dispatch: 0,
        }
    }
}

impl SimStats {
    /// Instructions per cycle over the whole run.
    pub fn ipc(&self) -> f64 {
        if self.cycles == 0 {
            0.0
        } else {
            self.instructions_retired as f64 / self.cycles as f64
        }
    }

    /// Wall-clock seconds since the simulator was constructed.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }
}
