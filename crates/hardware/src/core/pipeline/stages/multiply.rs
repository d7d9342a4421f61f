//! Two-cycle multiply unit.
//!
//! The unit latches one MUL from the issue queue and holds it across cycles
//! (a scoreboarded station). On its final cycle it computes the product from
//! the operand values latched at issue, writes the URF, drives the MUL bus,
//! wakes dependents, and completes the ROB slot.

use crate::core::Machine;
use crate::core::pipeline::Pipeline;
use crate::core::pipeline::latches::MulStation;
use crate::isa::FuType;

/// Executes the multiply-unit stage.
pub fn multiply_stage(m: &mut Machine, pl: &mut Pipeline) {
    if pl.mul_station.is_none() {
        if let Some(entry) = pl.iq.select(FuType::Mul) {
            pl.mul_station = Some(MulStation { entry, cycles: 0 });
        }
    }

    let done = match pl.mul_station.as_mut() {
        Some(station) => {
            station.cycles += 1;
            station.cycles >= pl.mul_latency
        }
        None => return,
    };
    if !done {
        return;
    }

    let Some(station) = pl.mul_station.take() else {
        return;
    };
    let entry = station.entry;
    let value = entry.src1_value.wrapping_mul(entry.src2_value);

    if let Some(dest) = entry.dest {
        pl.urf.write(dest, value);
        pl.buses.mul_bus.drive(dest, value);
        pl.iq.wakeup(dest, value);
        pl.lsq.wakeup(dest, value);
    }
    pl.rob.complete(entry.rob_slot, entry.pc, value, Some(value == 0));

    if m.trace {
        eprintln!("MU  pc={} MUL result={}", entry.pc, value);
    }
}
