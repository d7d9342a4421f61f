//! Commit stage: in-order retirement from the ROB head.
//!
//! Retires up to the commit width per cycle. A retiring write flips the
//! B-RAT (freeing the register it displaces), a retiring flag producer
//! commits the architectural zero flag, and a retiring branch releases its
//! CFID. Memory operations never retire here — the memory unit pops them
//! together with the LSQ head — and a HALT at the head ends the simulation.

use crate::core::Machine;
use crate::core::pipeline::Pipeline;
use crate::core::pipeline::rob::RobState;
use crate::isa::Opcode;

/// Executes the commit stage.
pub fn commit_stage(m: &mut Machine, pl: &mut Pipeline) {
    for _ in 0..pl.commit_width {
        let Some(head) = pl.rob.peek_head() else {
            break;
        };
        let opcode = head.opcode;

        if opcode == Opcode::Halt {
            let _ = pl.rob.retire_head();
            m.halted = true;
            m.stats.instructions_retired += 1;
            if m.trace {
                eprintln!("RT  HALT retired at clock {}", m.clock);
            }
            break;
        }

        // LOAD/STORE retire inside the memory unit, in lock step with the
        // LSQ head.
        if opcode.is_memory() {
            break;
        }
        if head.state != RobState::Completed {
            break;
        }

        let Some(entry) = pl.rob.retire_head() else {
            break;
        };

        if entry.opcode.is_control_flow() {
            if let Some(cfid) = entry.cfid {
                pl.cfids.release(cfid);
                // Younger instructions tagged with this identifier are no
                // longer speculative; detach them before the id recycles.
                pl.iq.clear_cfid(cfid);
                pl.lsq.clear_cfid(cfid);
            }
        }

        if let (Some(arch), Some(phys)) = (entry.arch_rd, entry.phys_rd) {
            pl.urf.commit(arch, phys);
        }
        if let Some(flag) = entry.zero_flag {
            m.zero_flag = flag;
        }

        m.stats.instructions_retired += 1;
        match entry.opcode {
            Opcode::Mul => m.stats.inst_mul += 1,
            Opcode::Bz | Opcode::Bnz | Opcode::Jump | Opcode::Jal => m.stats.inst_branch += 1,
            _ => m.stats.inst_alu += 1,
        }

        if m.trace {
            eprintln!(
                "RT  pc={} {} result={} zf={:?}",
                entry.pc, entry.opcode, entry.result, entry.zero_flag
            );
        }
    }
}
