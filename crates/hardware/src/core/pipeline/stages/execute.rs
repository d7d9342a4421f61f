//! Integer unit: address generation, ALU execution, branch resolution.
//!
//! The integer unit makes two selections from the issue queue per cycle:
//! one load/store entry, whose effective address it computes and writes into
//! the LSQ, and one integer entry, which it executes to completion in a
//! single cycle — writing the URF, driving the INT bus, waking dependents,
//! and marking the ROB slot.
//!
//! Branches resolve here as well. The predicate flag comes from the nearest
//! completed flag producer between the ROB head and the branch (falling back
//! to the architectural flag). A satisfied predicate — or any JUMP/JAL — is
//! a taken branch: the front-end latches are invalidated, everything younger
//! than the branch is squashed from ROB/IQ/LSQ, the CFID pool and rename
//! state roll back to the branch's snapshot, and the PC is redirected.

use crate::core::Machine;
use crate::core::pipeline::Pipeline;
use crate::core::pipeline::iq::IqEntry;
use crate::isa::{FuType, Opcode};

/// Executes the integer-unit stage.
pub fn execute_stage(m: &mut Machine, pl: &mut Pipeline) {
    generate_address(m, pl);

    let Some(entry) = pl.iq.select(FuType::Int) else {
        return;
    };

    match entry.opcode {
        Opcode::Movc => {
            writeback(m, pl, &entry, entry.imm, None);
        }
        Opcode::Add => {
            let v = entry.src1_value.wrapping_add(entry.src2_value);
            writeback(m, pl, &entry, v, Some(v == 0));
        }
        Opcode::Sub => {
            let v = entry.src1_value.wrapping_sub(entry.src2_value);
            writeback(m, pl, &entry, v, Some(v == 0));
        }
        Opcode::And => {
            let v = entry.src1_value & entry.src2_value;
            writeback(m, pl, &entry, v, Some(v == 0));
        }
        Opcode::Or => {
            let v = entry.src1_value | entry.src2_value;
            writeback(m, pl, &entry, v, Some(v == 0));
        }
        Opcode::Exor => {
            let v = entry.src1_value ^ entry.src2_value;
            writeback(m, pl, &entry, v, Some(v == 0));
        }
        Opcode::Addl => {
            let v = entry.src1_value.wrapping_add(entry.imm);
            writeback(m, pl, &entry, v, Some(v == 0));
        }
        Opcode::Subl => {
            let v = entry.src1_value.wrapping_sub(entry.imm);
            writeback(m, pl, &entry, v, Some(v == 0));
        }
        Opcode::Bz | Opcode::Bnz => {
            let flag = pl.rob.flag_before(entry.rob_slot).unwrap_or(m.zero_flag);
            let taken = if entry.opcode == Opcode::Bz { flag } else { !flag };
            if let Some(cfid) = entry.cfid {
                pl.cfids.record_prediction(cfid, entry.pc, taken);
            }
            if m.trace {
                eprintln!("EX  pc={} {} flag={} taken={}", entry.pc, entry.opcode, flag, taken);
            }
            if taken {
                let target = (entry.pc as i32).wrapping_add(entry.imm) as u32;
                take_branch(m, pl, &entry, target);
            }
            pl.rob.complete(entry.rob_slot, entry.pc, entry.imm, None);
        }
        Opcode::Jump => {
            if let Some(cfid) = entry.cfid {
                pl.cfids.record_prediction(cfid, entry.pc, true);
            }
            let target = entry.src1_value.wrapping_add(entry.imm) as u32;
            take_branch(m, pl, &entry, target);
            pl.rob.complete(entry.rob_slot, entry.pc, entry.imm, None);
        }
        Opcode::Jal => {
            if let Some(cfid) = entry.cfid {
                pl.cfids.record_prediction(cfid, entry.pc, true);
            }
            let link = (entry.pc + 4) as i32;
            let target = entry.src1_value.wrapping_add(entry.imm) as u32;
            take_branch(m, pl, &entry, target);
            writeback(m, pl, &entry, link, Some(link == 0));
        }
        _ => {}
    }
}

/// One load/store selection per cycle: compute the effective address and
/// resolve the LSQ slot. For stores the latched data value travels with it.
fn generate_address(m: &mut Machine, pl: &mut Pipeline) {
    let Some(entry) = pl.iq.select(FuType::Ls) else {
        return;
    };
    let (base, store_data) = match entry.opcode {
        // STORE: rs2 carries the base, rs1 the data.
        Opcode::Store => (entry.src2_value, Some((entry.src1_value, entry.src1_valid))),
        _ => (entry.src1_value, None),
    };
    let address = base.wrapping_add(entry.imm);
    if let Some(slot) = entry.lsq_slot {
        pl.lsq.resolve(slot, address, store_data);
    }
    if m.trace {
        eprintln!("AG  pc={} {} addr={}", entry.pc, entry.opcode, address);
    }
}

/// Common completion path for integer results: URF write, INT-bus broadcast,
/// wakeups, and ROB completion.
fn writeback(m: &mut Machine, pl: &mut Pipeline, entry: &IqEntry, value: i32, flag: Option<bool>) {
    if let Some(dest) = entry.dest {
        pl.urf.write(dest, value);
        pl.buses.int_bus.drive(dest, value);
        pl.iq.wakeup(dest, value);
        pl.lsq.wakeup(dest, value);
        if m.trace {
            eprintln!("EX  pc={} {} {}={}", entry.pc, entry.opcode, dest, value);
        }
    }
    pl.rob.complete(entry.rob_slot, entry.pc, value, flag);
}

/// The taken-branch sequence: an atomic within-tick flush and redirect.
fn take_branch(m: &mut Machine, pl: &mut Pipeline, entry: &IqEntry, target: u32) {
    let Some(cfid) = entry.cfid else {
        return;
    };

    // 1. Invalidate the front-end latches; the stages skip this tick.
    pl.fetch_latch = None;
    pl.decode_latch = None;
    pl.dispatch_latch = None;
    pl.frontend_flushed = true;
    // A squashed HALT no longer gates fetch.
    pl.fetch_enabled = true;

    // 2. Squash everything younger than the branch.
    let squashed_rob = pl.rob.flush_after(entry.rob_slot);
    let squashed_cfids = pl.cfids.squash_from(cfid);
    let _ = pl.iq.flush(&squashed_cfids);
    let _ = pl.lsq.flush(&squashed_cfids);
    let mul_squashed = pl
        .mul_station
        .as_ref()
        .and_then(|st| st.entry.cfid)
        .is_some_and(|c| squashed_cfids.contains(&c));
    if mul_squashed {
        pl.mul_station = None;
    }
    // Bus tags may name squashed registers; drop them.
    pl.buses.begin_cycle();

    // 3. Roll the rename state back to the snapshot taken at dispatch.
    if let Some(snapshot) = pl.rob.take_snapshot(entry.rob_slot) {
        let live = pl.rob.live_dests();
        pl.urf.restore(&snapshot, &live);
    }

    // 4. Redirect.
    m.pc = target;
    m.stats.branches_taken += 1;
    m.stats.entries_squashed += squashed_rob as u64;
    if m.trace {
        eprintln!(
            "EX  pc={} {} TAKEN -> {} (squashed {} rob entries, cfids {:?})",
            entry.pc, entry.opcode, target, squashed_rob, squashed_cfids
        );
    }
}
