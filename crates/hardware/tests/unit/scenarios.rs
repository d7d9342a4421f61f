//! End-to-end pipeline scenarios.
//!
//! Whole programs through the loader and the full tick loop, asserting on
//! architectural state after HALT retires: B-RAT-resolved register values,
//! the committed zero flag, data memory, and coarse timing bounds.

use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::run_program;

#[test]
fn add_commits_through_the_back_rename_table() {
    let sim = run_program(
        "MOVC,R1,#5\n\
         MOVC,R2,#7\n\
         ADD,R3,R1,R2\n\
         HALT",
    );
    assert_eq!(sim.architectural_value(1), Some(5));
    assert_eq!(sim.architectural_value(2), Some(7));
    assert_eq!(sim.architectural_value(3), Some(12));
    assert!(!sim.machine.zero_flag);
}

#[test]
fn zero_result_sets_the_architectural_flag() {
    let sim = run_program(
        "MOVC,R1,#0\n\
         MOVC,R2,#0\n\
         ADD,R3,R1,R2\n\
         HALT",
    );
    assert_eq!(sim.architectural_value(3), Some(0));
    assert!(sim.machine.zero_flag);
}

#[test]
fn multiply_forwards_to_a_dependent_add() {
    let mut sim = crate::common::simulator(
        "MOVC,R1,#3\n\
         MOVC,R2,#4\n\
         MUL,R3,R1,R2\n\
         ADD,R4,R3,R3\n\
         HALT",
    );
    crate::common::run_checked(&mut sim);
    assert_eq!(sim.architectural_value(3), Some(12));
    assert_eq!(sim.architectural_value(4), Some(24));
    // The MUL occupies its unit for two cycles and the dependent ADD takes
    // another; the whole program cannot finish inside the MUL latency.
    assert!(sim.machine.clock > 2 + 1);
}

#[test]
fn untaken_branch_commits_the_fall_through_path() {
    let sim = run_program(
        "MOVC,R1,#1\n\
         BZ,#8\n\
         MOVC,R2,#99\n\
         MOVC,R3,#42\n\
         HALT",
    );
    // MOVC produces no flag, so the architectural flag stays at its reset
    // value and BZ falls through.
    assert!(!sim.machine.zero_flag);
    assert_eq!(sim.architectural_value(2), Some(99));
    assert_eq!(sim.architectural_value(3), Some(42));
}

#[test]
fn taken_branch_squashes_the_wrong_path() {
    let sim = run_program(
        "MOVC,R1,#0\n\
         ADD,R2,R1,R1\n\
         BZ,#8\n\
         MOVC,R3,#111\n\
         MOVC,R4,#222\n\
         HALT",
    );
    // ADD of zero sets the flag; BZ jumps over the R3 write.
    assert!(sim.machine.zero_flag);
    assert_eq!(sim.architectural_value(4), Some(222));
    // R3 still resolves to its reset mapping: the speculative rename was
    // rolled back and never committed.
    assert_eq!(sim.architectural_value(3), Some(0));
}

#[test]
fn store_then_load_observes_memory_in_order() {
    let sim = run_program(
        "MOVC,R1,#10\n\
         STORE,R1,R0,#4\n\
         LOAD,R2,R0,#4\n\
         HALT",
    );
    assert_eq!(sim.machine.data_memory[4], 10);
    assert_eq!(sim.architectural_value(2), Some(10));
    assert_eq!(sim.machine.stats.inst_store, 1);
    assert_eq!(sim.machine.stats.inst_load, 1);
}

#[rstest]
#[case("ADD", 12)]
#[case("SUB", 6)]
#[case("AND", 1)]
#[case("OR", 11)]
#[case("EX-OR", 10)]
#[case("MUL", 27)]
fn alu_results_commit(#[case] op: &str, #[case] expected: i32) {
    let sim = run_program(&format!(
        "MOVC,R1,#9\n\
         MOVC,R2,#3\n\
         {op},R3,R1,R2\n\
         HALT"
    ));
    assert_eq!(sim.architectural_value(3), Some(expected));
}

#[rstest]
#[case("ADDL", 13)]
#[case("SUBL", 5)]
fn literal_arithmetic_commits(#[case] op: &str, #[case] expected: i32) {
    let sim = run_program(&format!(
        "MOVC,R1,#9\n\
         {op},R2,R1,#4\n\
         HALT"
    ));
    assert_eq!(sim.architectural_value(2), Some(expected));
}

#[test]
fn dependent_chain_forwards_over_the_int_bus() {
    let sim = run_program(
        "MOVC,R1,#1\n\
         ADDL,R2,R1,#1\n\
         ADDL,R3,R2,#1\n\
         ADDL,R4,R3,#1\n\
         HALT",
    );
    assert_eq!(sim.architectural_value(4), Some(4));
}

#[test]
fn instruction_reading_its_own_destination_sees_the_old_value() {
    let sim = run_program(
        "MOVC,R1,#6\n\
         ADDL,R1,R1,#1\n\
         HALT",
    );
    assert_eq!(sim.architectural_value(1), Some(7));
}

#[test]
fn jump_redirects_and_skips_the_fall_through() {
    // JUMP to R1 + 0 where R1 holds the address of the R3 write.
    let sim = run_program(
        "MOVC,R1,#4012\n\
         JUMP,R1,#0\n\
         MOVC,R2,#55\n\
         MOVC,R3,#66\n\
         HALT",
    );
    assert_eq!(sim.architectural_value(3), Some(66));
    assert_eq!(sim.architectural_value(2), Some(0));
}

#[test]
fn jal_links_and_redirects() {
    // JAL at pc 4004: link value is 4008, target is R1 + 0 = 4012.
    let sim = run_program(
        "MOVC,R1,#4012\n\
         JAL,R5,R1,#0\n\
         MOVC,R2,#55\n\
         MOVC,R3,#66\n\
         HALT",
    );
    assert_eq!(sim.architectural_value(5), Some(4008));
    assert_eq!(sim.architectural_value(2), Some(0));
    assert_eq!(sim.architectural_value(3), Some(66));
}

#[test]
fn bnz_taken_when_flag_clear() {
    let sim = run_program(
        "MOVC,R1,#5\n\
         ADD,R2,R1,R1\n\
         BNZ,#8\n\
         MOVC,R3,#111\n\
         MOVC,R4,#222\n\
         HALT",
    );
    // ADD result 10: flag clear, BNZ taken, R3 write squashed.
    assert_eq!(sim.architectural_value(3), Some(0));
    assert_eq!(sim.architectural_value(4), Some(222));
}

#[test]
fn stores_drain_before_halt_retires() {
    let sim = run_program(
        "MOVC,R1,#1\n\
         MOVC,R2,#2\n\
         STORE,R1,R0,#0\n\
         STORE,R2,R0,#1\n\
         HALT",
    );
    assert_eq!(sim.machine.data_memory[0], 1);
    assert_eq!(sim.machine.data_memory[1], 2);
}

#[test]
fn load_feeds_a_dependent_alu_op() {
    let sim = run_program(
        "MOVC,R1,#21\n\
         STORE,R1,R0,#3\n\
         LOAD,R2,R0,#3\n\
         ADD,R3,R2,R2\n\
         HALT",
    );
    assert_eq!(sim.architectural_value(3), Some(42));
}

#[test]
fn retired_count_and_cycles_are_tracked() {
    let sim = run_program(
        "MOVC,R1,#5\n\
         MOVC,R2,#7\n\
         ADD,R3,R1,R2\n\
         HALT",
    );
    let stats = &sim.machine.stats;
    assert_eq!(stats.instructions_retired, 4);
    assert_eq!(stats.inst_alu, 3);
    assert_eq!(stats.cycles, sim.machine.clock);
    assert!(stats.ipc() > 0.0);
}

#[test]
fn program_without_halt_just_drains() {
    let mut sim = crate::common::simulator("MOVC,R1,#5\nMOVC,R2,#6");
    let clock = sim.run_cycles(40, apex_core::sim::simulator::DisplayMode::Silent);
    assert_eq!(clock, 40);
    assert!(!sim.halted());
    // In-flight work still completed and committed.
    assert_eq!(sim.architectural_value(1), Some(5));
    assert_eq!(sim.architectural_value(2), Some(6));
}
