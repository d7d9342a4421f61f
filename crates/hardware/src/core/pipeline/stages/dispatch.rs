//! Dispatch stage: coordinated queue admission.
//!
//! Builds the IQ entry (with operand values captured through the forwarding
//! buses), the ROB entry, and — for memory operations — the LSQ entry. The
//! three admissions are atomic: capacity is checked up front and the latch
//! is held for a retry when any queue is full. Control-flow instructions get
//! a value snapshot of the rename state attached to their ROB entry here,
//! before any younger instruction renames.

use crate::core::Machine;
use crate::core::pipeline::Pipeline;
use crate::core::pipeline::iq::IqEntry;
use crate::core::pipeline::lsq::{LsqEntry, MemOp};
use crate::core::pipeline::rob::{RobEntry, RobState};
use crate::core::pipeline::urf::PhysReg;
use crate::isa::Opcode;

/// Executes the dispatch stage.
pub fn dispatch_stage(m: &mut Machine, pl: &mut Pipeline) {
    if pl.frontend_flushed {
        return;
    }
    let Some(renamed) = pl.dispatch_latch else {
        return;
    };
    let inst = renamed.inst;
    let needs_lsq = inst.opcode.is_memory();

    if pl.iq.is_full() || pl.rob.is_full() || (needs_lsq && pl.lsq.is_full()) {
        m.stats.stalls_dispatch += 1;
        return;
    }

    let (src1_value, src1_valid) = capture(pl, renamed.src1);
    let (src2_value, src2_valid) = capture(pl, renamed.src2);

    // Snapshot before admission so rollback lands on the state that existed
    // when the branch entered the window (including its own rename, for JAL).
    let snapshot = inst.opcode.is_control_flow().then(|| pl.urf.snapshot());

    let Some(rob_slot) = pl.rob.admit(RobEntry {
        pc: inst.pc,
        opcode: inst.opcode,
        arch_rd: inst.opcode.writes_register().then_some(inst.rd),
        phys_rd: renamed.dest,
        cfid: renamed.cfid,
        state: RobState::Pending,
        result: inst.imm,
        zero_flag: None,
        snapshot,
    }) else {
        return;
    };

    let lsq_slot = if needs_lsq {
        let op = if inst.opcode == Opcode::Store {
            MemOp::Store
        } else {
            MemOp::Load
        };
        pl.lsq.allocate(LsqEntry {
            pc: inst.pc,
            op,
            address: None,
            dest: renamed.dest,
            src: if op == MemOp::Store { renamed.src1 } else { None },
            src_value: src1_value,
            src_valid: if op == MemOp::Store { src1_valid } else { true },
            rob_slot,
            cfid: renamed.cfid,
        })
    } else {
        None
    };

    let admitted = pl.iq.enqueue(IqEntry {
        pc: inst.pc,
        opcode: inst.opcode,
        fu: renamed.fu,
        dest: renamed.dest,
        src1: renamed.src1,
        src1_value,
        src1_valid,
        src2: renamed.src2,
        src2_value,
        src2_valid,
        imm: inst.imm,
        lsq_slot,
        rob_slot,
        cfid: renamed.cfid,
        enqueued_at: m.clock,
    });
    debug_assert!(admitted, "IQ admission checked before ROB allocation");

    if m.trace {
        eprintln!(
            "DQ  pc={} {} rob={} lsq={:?} rdy=({},{})",
            inst.pc, inst, rob_slot, lsq_slot, src1_valid, src2_valid
        );
    }

    pl.dispatch_latch = None;
}

/// Resolves a source operand at dispatch: INT bus, MUL bus, then the URF.
/// Absent sources are trivially ready.
fn capture(pl: &Pipeline, src: Option<PhysReg>) -> (i32, bool) {
    match src {
        None => (0, true),
        Some(phys) => match pl.buses.resolve(phys, &pl.urf) {
            Some(value) => (value, true),
            None => (0, false),
        },
    }
}
