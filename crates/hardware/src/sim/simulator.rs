//! Top-level simulator: owns the machine and the pipeline side-by-side.
//!
//! Keeping the architectural state and the pipeline as sibling fields lets
//! the stage functions borrow both without back-pointers or interior
//! mutability. The driver surface is:
//! 1. **`new`:** Construct from a program; PC at the base, pipeline empty.
//! 2. **`run` / `run_cycles`:** Step until HALT retires (optionally bounded,
//!    optionally printing a per-cycle display).
//! 3. **`state_dump`:** Render the URF, rename tables, and the first data
//!    memory words.

use std::fmt::Write as _;

use crate::config::SimConfig;
use crate::core::Machine;
use crate::core::pipeline::Pipeline;
use crate::isa::Instruction;

/// Words of data memory included in the state dump.
const DUMP_MEMORY_WORDS: usize = 15;

/// Per-cycle output mode for [`Simulator::run_cycles`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// No per-cycle output.
    #[default]
    Silent,
    /// Print a cycle banner and the stage contents every tick.
    PerCycle,
}

/// The simulator: architectural state plus pipeline.
#[derive(Debug)]
pub struct Simulator {
    /// Architectural machine state.
    pub machine: Machine,
    /// Speculative pipeline state.
    pub pipeline: Pipeline,
}

impl Simulator {
    /// Creates a simulator for the given program.
    pub fn new(program: Vec<Instruction>, config: &SimConfig) -> Self {
        tracing::debug!(
            instructions = program.len(),
            rob = config.rob_size,
            iq = config.iq_size,
            lsq = config.lsq_size,
            "simulator initialized"
        );
        Self {
            machine: Machine::new(program, config),
            pipeline: Pipeline::new(config),
        }
    }

    /// True once HALT has retired.
    pub fn halted(&self) -> bool {
        self.machine.halted
    }

    /// Advances the simulator by one clock cycle.
    pub fn tick(&mut self) {
        self.pipeline.tick(&mut self.machine);
    }

    /// Steps until HALT retires. Returns the cycle count.
    pub fn run(&mut self) -> u64 {
        while !self.machine.halted {
            self.tick();
        }
        tracing::info!(
            cycles = self.machine.clock,
            retired = self.machine.stats.instructions_retired,
            "simulation complete"
        );
        self.machine.clock
    }

    /// Steps `cycles` cycles or until HALT retires, whichever comes first.
    /// With [`DisplayMode::PerCycle`] a banner and the stage contents are
    /// printed every tick.
    pub fn run_cycles(&mut self, cycles: u64, mode: DisplayMode) -> u64 {
        let limit = self.machine.clock + cycles;
        while !self.machine.halted && self.machine.clock < limit {
            if mode == DisplayMode::PerCycle {
                println!(
                    "---------------- CLOCK CYCLE {} ----------------",
                    self.machine.clock + 1
                );
            }
            self.tick();
            if mode == DisplayMode::PerCycle {
                print!("{}", self.render_stages());
            }
        }
        self.machine.clock
    }

    /// Checks the cross-cutting pipeline invariants (test hook).
    pub fn check_invariants(&self) -> Result<(), String> {
        self.pipeline.check_invariants()
    }

    /// The architectural value of a register, resolved through the B-RAT.
    pub fn architectural_value(&self, arch: usize) -> Option<i32> {
        self.pipeline.urf.architectural_value(arch)
    }

    /// Renders the stage latches after a tick (per-cycle display).
    fn render_stages(&self) -> String {
        fn latch<T: std::fmt::Display>(slot: Option<&T>) -> String {
            slot.map_or_else(|| "EMPTY".to_string(), ToString::to_string)
        }

        let pl = &self.pipeline;
        let mut out = String::new();
        let _ = writeln!(out, "Fetch          : {}", latch(pl.fetch_latch.as_ref()));
        let _ = writeln!(out, "Decode/Rename  : {}", latch(pl.decode_latch.as_ref()));
        let _ = writeln!(
            out,
            "Dispatch       : {}",
            pl.dispatch_latch
                .as_ref()
                .map_or_else(|| "EMPTY".to_string(), |r| r.inst.to_string())
        );
        let _ = writeln!(
            out,
            "MUL FU         : {}",
            pl.mul_station.as_ref().map_or_else(
                || "EMPTY".to_string(),
                |st| format!("pc({}) cycle {}", st.entry.pc, st.cycles)
            )
        );
        let _ = writeln!(
            out,
            "MEM FU         : {}",
            pl.mem_station.as_ref().map_or_else(
                || "EMPTY".to_string(),
                |st| format!("pc({}) cycle {}", st.pc, st.cycles)
            )
        );
        let _ = writeln!(
            out,
            "IQ/ROB/LSQ     : {}/{}/{} entries",
            pl.iq.len(),
            pl.rob.len(),
            pl.lsq.len()
        );
        out
    }

    /// Renders the final machine state: URF contents, both rename tables,
    /// and the first data memory words.
    pub fn state_dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=============== STATE OF URF ===============");
        for (phys, value, valid) in self.pipeline.urf.iter_regs() {
            let status = if valid { "VALID" } else { "INVALID" };
            let _ = writeln!(out, "|  {phys:>4}  |  Value = {value:<11}  |  Status = {status:<7}  |");
        }
        let _ = writeln!(out, "=============== RENAME TABLE (F-RAT) ===============");
        for (arch, mapping) in self.pipeline.urf.iter_f_rat() {
            let target = mapping.map_or_else(|| "--".to_string(), |p| p.to_string());
            let _ = writeln!(out, "|  R{arch:<2} -> {target:<4} |");
        }
        let _ = writeln!(out, "=============== RENAME TABLE (B-RAT) ===============");
        for (arch, mapping) in self.pipeline.urf.iter_b_rat() {
            let target = mapping.map_or_else(|| "--".to_string(), |p| p.to_string());
            let _ = writeln!(out, "|  R{arch:<2} -> {target:<4} |");
        }
        let _ = writeln!(out, "============== STATE OF DATA MEMORY ==============");
        for address in 0..DUMP_MEMORY_WORDS {
            let _ = writeln!(
                out,
                "|  MEM[{address:<2}]  |  Data Value = {}  |",
                self.machine.data_memory.get(address).copied().unwrap_or(0)
            );
        }
        out
    }
}
