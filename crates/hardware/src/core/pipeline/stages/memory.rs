//! Three-cycle memory unit over the LSQ head.
//!
//! Memory operations execute strictly in order: the unit tracks the LSQ
//! head and advances its cycle counter only when the head's address (and,
//! for stores, data) is resolved and the head's ROB slot has reached the
//! ROB head. On the final cycle a STORE writes data memory and a LOAD reads
//! it, writes the URF, and drives the MEM bus; both pop the LSQ head and
//! retire the ROB head in the same cycle so the two queues stay in lock
//! step.

use crate::core::Machine;
use crate::core::pipeline::Pipeline;
use crate::core::pipeline::latches::MemStation;
use crate::core::pipeline::lsq::MemOp;

/// Executes the memory-unit stage.
pub fn memory_stage(m: &mut Machine, pl: &mut Pipeline) {
    let Some((head_slot, head)) = pl.lsq.head() else {
        pl.mem_station = None;
        return;
    };
    let head = *head;

    // (Re)latch whenever the head changed, including after a flush that
    // recycled the slot.
    let stale = match &pl.mem_station {
        Some(station) => station.lsq_slot != head_slot || station.pc != head.pc,
        None => true,
    };
    if stale {
        pl.mem_station = Some(MemStation {
            lsq_slot: head_slot,
            pc: head.pc,
            cycles: 0,
        });
    }

    // Strict in-order memory commit: only proceed when the operation is
    // fully resolved and sits at the ROB head.
    if !head.is_complete() || pl.rob.head_slot() != Some(head.rob_slot) {
        return;
    }

    let finished = match pl.mem_station.as_mut() {
        Some(station) => {
            station.cycles += 1;
            station.cycles >= pl.mem_latency
        }
        None => return,
    };
    if !finished {
        return;
    }
    pl.mem_station = None;

    let Some(address) = head.address else {
        return;
    };

    match head.op {
        MemOp::Store => {
            m.write_word(address, head.src_value);
            if m.trace {
                eprintln!("ME  pc={} STORE [{}]={}", head.pc, address, head.src_value);
            }
        }
        MemOp::Load => {
            let value = m.read_word(address);
            if let Some(dest) = head.dest {
                pl.urf.write(dest, value);
                pl.buses.mem_bus.drive(dest, value);
                pl.iq.wakeup(dest, value);
                pl.lsq.wakeup(dest, value);
            }
            if m.trace {
                eprintln!("ME  pc={} LOAD [{}]={}", head.pc, address, value);
            }
        }
    }

    // Retire the LSQ head and the ROB head together.
    let _ = pl.lsq.retire_head();
    if let Some(entry) = pl.rob.retire_head() {
        if let (Some(arch), Some(phys)) = (entry.arch_rd, entry.phys_rd) {
            pl.urf.commit(arch, phys);
        }
        m.stats.instructions_retired += 1;
        match head.op {
            MemOp::Load => m.stats.inst_load += 1,
            MemOp::Store => m.stats.inst_store += 1,
        }
    }
}
