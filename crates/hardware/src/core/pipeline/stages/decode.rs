//! Decode/rename stage.
//!
//! Renames architectural registers onto the URF and allocates a CFID for
//! control-flow instructions. Sources are read from the F-RAT before the
//! destination is renamed, so an instruction reading its own destination
//! sees the previous producer. The stage stalls — holding its latch and
//! thereby fetch — when the free list or the CFID pool is exhausted, or
//! when dispatch has not drained.
//!
//! HALT never reaches the issue queue: it is admitted to the ROB already
//! complete and switches fetch off until a flush squashes it.

use crate::core::Machine;
use crate::core::pipeline::Pipeline;
use crate::core::pipeline::latches::RenamedEntry;
use crate::core::pipeline::rob::{RobEntry, RobState};
use crate::core::pipeline::urf::PhysReg;
use crate::isa::{Instruction, Opcode};

/// Executes the decode/rename stage.
pub fn decode_stage(m: &mut Machine, pl: &mut Pipeline) {
    if pl.frontend_flushed {
        return;
    }
    let Some(inst) = pl.decode_latch else {
        return;
    };

    match inst.opcode {
        Opcode::Nop => {
            pl.decode_latch = None;
        }
        Opcode::Halt => {
            // Program order: wait for the dispatch latch to drain so the
            // HALT enters the ROB after everything older.
            if pl.dispatch_latch.is_some() || pl.rob.is_full() {
                return;
            }
            let entry = RobEntry {
                pc: inst.pc,
                opcode: Opcode::Halt,
                arch_rd: None,
                phys_rd: None,
                cfid: pl.cfids.current(),
                state: RobState::Completed,
                result: 0,
                zero_flag: None,
                snapshot: None,
            };
            if pl.rob.admit(entry).is_some() {
                pl.decode_latch = None;
                pl.fetch_latch = None;
                pl.fetch_enabled = false;
                if m.trace {
                    eprintln!("DR  pc={} HALT admitted, fetch disabled", inst.pc);
                }
            }
        }
        _ => {
            if pl.dispatch_latch.is_some() {
                return;
            }

            let needs_dest = inst.opcode.writes_register();
            let needs_cfid = inst.opcode.is_control_flow();
            if needs_dest && pl.urf.free_list_empty() {
                m.stats.stalls_rename += 1;
                return;
            }
            if needs_cfid && pl.cfids.is_exhausted() {
                m.stats.stalls_rename += 1;
                return;
            }

            // Sources first, so rd == rs resolves to the old mapping.
            let (src1, src2) = source_registers(&inst, pl);

            let dest = if needs_dest {
                match pl.urf.rename_write(inst.rd) {
                    Some(p) => Some(p),
                    None => return,
                }
            } else {
                None
            };

            let cfid = if needs_cfid {
                match pl.cfids.allocate() {
                    Some(c) => Some(c),
                    None => return,
                }
            } else {
                pl.cfids.current()
            };

            if m.trace {
                eprintln!(
                    "DR  pc={} {} dest={:?} src1={:?} src2={:?} cfid={:?}",
                    inst.pc, inst, dest, src1, src2, cfid
                );
            }

            pl.dispatch_latch = Some(RenamedEntry {
                inst,
                fu: inst.opcode.fu_type(),
                dest,
                src1,
                src2,
                cfid,
            });
            pl.decode_latch = None;
        }
    }
}

/// F-RAT reads per opcode. For STORE, `src1` carries the data register and
/// `src2` the address base.
fn source_registers(
    inst: &Instruction,
    pl: &Pipeline,
) -> (Option<PhysReg>, Option<PhysReg>) {
    match inst.opcode {
        Opcode::Add
        | Opcode::Sub
        | Opcode::And
        | Opcode::Or
        | Opcode::Exor
        | Opcode::Mul
        | Opcode::Store => (pl.urf.rename_read(inst.rs1), pl.urf.rename_read(inst.rs2)),
        Opcode::Addl | Opcode::Subl | Opcode::Load | Opcode::Jump | Opcode::Jal => {
            (pl.urf.rename_read(inst.rs1), None)
        }
        _ => (None, None),
    }
}
