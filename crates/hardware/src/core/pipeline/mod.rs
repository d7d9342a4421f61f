//! The out-of-order pipeline: queues, latches, and the tick driver.
//!
//! [`Pipeline`] owns every speculative structure — URF and rename tables,
//! CFID pool, issue queue, load/store queue, reorder buffer, forwarding
//! buses, and the stage latches. One call to [`Pipeline::tick`] advances a
//! single simulated cycle, running the stages in reverse program order so
//! each stage consumes the previous cycle's latch contents:
//!
//! commit → memory → execute → multiply → dispatch → decode → fetch
//!
//! Stalls are emergent: a stage that cannot hand its work downstream leaves
//! its latch occupied, and the upstream stage holds in turn. A taken branch
//! flushes the front-end latches within the tick and redirects the PC.

/// Operand forwarding buses.
pub mod bus;
/// Control-flow identifier pool.
pub mod cfid;
/// Issue queue.
pub mod iq;
/// Inter-stage latches.
pub mod latches;
/// Load/store queue.
pub mod lsq;
/// Reorder buffer.
pub mod rob;
/// Stage functions.
pub mod stages;
/// Unified register file and rename tables.
pub mod urf;

use crate::config::SimConfig;
use crate::core::Machine;
use crate::isa::Instruction;
use bus::ForwardingBuses;
use cfid::CfidPool;
use iq::IssueQueue;
use latches::{MemStation, MulStation, RenamedEntry};
use lsq::LoadStoreQueue;
use rob::{Rob, RobState};
use urf::Urf;

/// All speculative machine state and the stage latches.
#[derive(Debug)]
pub struct Pipeline {
    /// Unified register file with both rename tables.
    pub urf: Urf,
    /// Control-flow identifier pool.
    pub cfids: CfidPool,
    /// Issue queue.
    pub iq: IssueQueue,
    /// Load/store queue.
    pub lsq: LoadStoreQueue,
    /// Reorder buffer.
    pub rob: Rob,
    /// Forwarding buses, cleared each tick.
    pub buses: ForwardingBuses,

    /// Mirror of the most recently fetched instruction (display only).
    pub fetch_latch: Option<Instruction>,
    /// Fetch → decode latch.
    pub decode_latch: Option<Instruction>,
    /// Decode → dispatch latch.
    pub dispatch_latch: Option<RenamedEntry>,
    /// Multiply unit occupancy.
    pub mul_station: Option<MulStation>,
    /// Memory unit occupancy.
    pub mem_station: Option<MemStation>,

    /// Cleared by HALT at decode; restored when a flush squashes the HALT.
    pub fetch_enabled: bool,
    /// Set for the remainder of a tick by a taken branch; the front-end
    /// stages skip their turn so the redirect costs a full cycle.
    pub frontend_flushed: bool,

    pub(crate) commit_width: usize,
    pub(crate) mul_latency: u64,
    pub(crate) mem_latency: u64,
}

impl Pipeline {
    /// Creates an empty pipeline sized from the configuration.
    pub fn new(config: &SimConfig) -> Self {
        Self {
            urf: Urf::new(config.urf_size, config.arch_regs),
            cfids: CfidPool::new(config.cfid_size),
            iq: IssueQueue::new(config.iq_size),
            lsq: LoadStoreQueue::new(config.lsq_size),
            rob: Rob::new(config.rob_size),
            buses: ForwardingBuses::default(),
            fetch_latch: None,
            decode_latch: None,
            dispatch_latch: None,
            mul_station: None,
            mem_station: None,
            fetch_enabled: true,
            frontend_flushed: false,
            commit_width: config.commit_width,
            mul_latency: config.mul_latency,
            mem_latency: config.mem_latency,
        }
    }

    /// Advances one simulated cycle.
    pub fn tick(&mut self, m: &mut Machine) {
        self.buses.begin_cycle();
        self.frontend_flushed = false;

        stages::commit::commit_stage(m, self);
        if !m.halted {
            stages::memory::memory_stage(m, self);
            stages::execute::execute_stage(m, self);
            stages::multiply::multiply_stage(m, self);
            stages::dispatch::dispatch_stage(m, self);
            stages::decode::decode_stage(m, self);
            stages::fetch::fetch_stage(m, self);
        }

        m.clock += 1;
        m.stats.cycles += 1;
    }

    /// Checks the cross-cutting pipeline invariants. Called by tests after
    /// every tick; returns a description of the first violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        let capacity = self.urf.capacity();
        let mut claims = vec![0usize; capacity];

        // Single writer: each physical register is the destination of at
        // most one in-flight (pending) producer.
        let mut pending_dests = vec![0usize; capacity];
        for entry in self.rob.iter() {
            if entry.state == RobState::Pending {
                if let Some(p) = entry.phys_rd {
                    pending_dests[p.0] += 1;
                }
            }
        }
        if let Some(renamed) = &self.dispatch_latch {
            if let Some(p) = renamed.dest {
                pending_dests[p.0] += 1;
            }
        }
        if let Some((reg, _)) = pending_dests.iter().enumerate().find(|(_, n)| **n > 1) {
            return Err(format!("physical U{reg} has multiple in-flight writers"));
        }

        // Free-list conservation: every physical register is exactly one of
        // free or reachable (B-RAT, surviving ROB destination, or a renamed
        // destination still in the dispatch latch).
        for phys in self.urf.iter_free() {
            claims[phys.0] += 1;
        }
        let mut reachable = vec![false; capacity];
        for (_, mapping) in self.urf.iter_b_rat() {
            if let Some(p) = mapping {
                reachable[p.0] = true;
            }
        }
        for p in self.rob.live_dests() {
            reachable[p.0] = true;
        }
        if let Some(renamed) = &self.dispatch_latch {
            if let Some(p) = renamed.dest {
                reachable[p.0] = true;
            }
        }
        for (reg, live) in reachable.iter().enumerate() {
            if *live {
                claims[reg] += 1;
            }
        }
        if let Some((reg, n)) = claims.iter().enumerate().find(|(_, n)| **n != 1) {
            return Err(format!(
                "physical U{reg} claimed {n} times (free list vs reachable set)"
            ));
        }

        // The F-RAT may only name reachable registers.
        for (arch, mapping) in self.urf.iter_f_rat() {
            if let Some(p) = mapping {
                if !reachable[p.0] {
                    return Err(format!("F-RAT[R{arch}] points at unreachable U{}", p.0));
                }
            }
        }

        // Every LSQ entry agrees with its ROB slot.
        for entry in self.lsq.iter() {
            match self.rob.entry(entry.rob_slot) {
                Some(rob_entry) if rob_entry.pc == entry.pc => {}
                _ => {
                    return Err(format!(
                        "LSQ entry pc={} disagrees with ROB slot {}",
                        entry.pc, entry.rob_slot
                    ));
                }
            }
        }

        // Every IQ entry agrees with its ROB slot.
        for entry in self.iq.iter() {
            match self.rob.entry(entry.rob_slot) {
                Some(rob_entry) if rob_entry.pc == entry.pc => {}
                _ => {
                    return Err(format!(
                        "IQ entry pc={} disagrees with ROB slot {}",
                        entry.pc, entry.rob_slot
                    ));
                }
            }
        }

        Ok(())
    }
}
