//! Shared test infrastructure.
//!
//! Builds simulators from assembly text and runs them with the pipeline
//! invariants checked after every tick.

use apex_core::sim::loader::parse_program;
use apex_core::sim::simulator::Simulator;
use apex_core::SimConfig;

/// Safety bound for checked runs; no test program needs this many cycles.
pub const CYCLE_BOUND: u64 = 10_000;

/// Installs a `RUST_LOG`-driven tracing subscriber for test debugging.
/// Only the first call wins; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Builds a simulator from assembly text with the default configuration.
pub fn simulator(asm: &str) -> Simulator {
    simulator_with(asm, &SimConfig::default())
}

/// Builds a simulator from assembly text with a custom configuration.
pub fn simulator_with(asm: &str, config: &SimConfig) -> Simulator {
    init_tracing();
    let program = parse_program(asm).expect("test program must parse");
    Simulator::new(program, config)
}

/// Runs to HALT, asserting the cross-cutting invariants after every tick.
/// Panics if the program does not halt within the safety bound.
pub fn run_checked(sim: &mut Simulator) {
    for _ in 0..CYCLE_BOUND {
        if sim.halted() {
            return;
        }
        sim.tick();
        if let Err(violation) = sim.check_invariants() {
            panic!(
                "invariant violated at clock {}: {violation}",
                sim.machine.clock
            );
        }
    }
    panic!("program did not halt within {CYCLE_BOUND} cycles");
}

/// Parses, runs checked, and returns the finished simulator.
pub fn run_program(asm: &str) -> Simulator {
    let mut sim = simulator(asm);
    run_checked(&mut sim);
    sim
}
