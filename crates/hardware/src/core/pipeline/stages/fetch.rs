//! Fetch stage.
//!
//! Reads the instruction at the current PC and hands it to decode. The PC
//! advances only when the decode latch accepts the instruction; a stalled
//! decode holds fetch in place. Past the end of code memory the stage goes
//! quiet and in-flight work drains.

use crate::core::Machine;
use crate::core::pipeline::Pipeline;

/// Executes the fetch stage.
pub fn fetch_stage(m: &mut Machine, pl: &mut Pipeline) {
    if pl.frontend_flushed || !pl.fetch_enabled {
        return;
    }
    if pl.decode_latch.is_some() {
        // Decode stalled: hold the PC and the latch.
        return;
    }

    match m.instruction_at(m.pc) {
        Some(inst) => {
            if m.trace {
                eprintln!("IF  pc={} {}", m.pc, inst);
            }
            pl.fetch_latch = Some(inst);
            pl.decode_latch = Some(inst);
            m.pc += 4;
        }
        None => {
            // Out-of-range fetch: nothing to supply.
            pl.fetch_latch = None;
        }
    }
}
