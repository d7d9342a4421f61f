//! Branch speculation, flush, and recovery.
//!
//! Exercises the CFID machinery end to end: snapshot restore on taken
//! branches, CFID pool recycling across many branches, squashed memory
//! operations, and a speculative HALT that must not stop the machine.

use pretty_assertions::assert_eq;

use crate::common::{run_checked, run_program, simulator};

#[test]
fn squashed_store_never_reaches_memory() {
    // The taken BZ skips the store on the wrong path.
    let sim = run_program(
        "MOVC,R1,#0\n\
         MOVC,R2,#77\n\
         ADD,R3,R1,R1\n\
         BZ,#8\n\
         STORE,R2,R0,#9\n\
         HALT",
    );
    assert_eq!(sim.machine.data_memory[9], 0);
    assert_eq!(sim.machine.stats.inst_store, 0);
}

#[test]
fn squashed_load_never_commits() {
    let sim = run_program(
        "MOVC,R1,#0\n\
         ADD,R2,R1,R1\n\
         BZ,#8\n\
         LOAD,R3,R0,#9\n\
         HALT",
    );
    assert_eq!(sim.machine.stats.inst_load, 0);
    assert_eq!(sim.architectural_value(3), Some(0));
}

#[test]
fn speculative_halt_is_squashed_by_a_taken_branch() {
    // The wrong path contains a HALT; the right path writes R4 and halts
    // later. If the flush failed to revive fetch the program would stop
    // early and R4 would stay 0.
    let sim = run_program(
        "MOVC,R1,#0\n\
         ADD,R2,R1,R1\n\
         BZ,#8\n\
         HALT\n\
         MOVC,R4,#44\n\
         HALT",
    );
    assert_eq!(sim.architectural_value(4), Some(44));
}

#[test]
fn cfid_pool_recycles_across_many_branches() {
    // Twelve untaken branches exceed the pool size of seven; retirement
    // must recycle identifiers or decode deadlocks.
    let mut asm = String::from("MOVC,R1,#1\n");
    for _ in 0..12 {
        asm.push_str("BZ,#8\nMOVC,R2,#9\n");
    }
    asm.push_str("HALT");
    let sim = run_program(&asm);
    assert_eq!(sim.architectural_value(2), Some(9));
    assert_eq!(sim.machine.stats.inst_branch, 12);
}

#[test]
fn back_to_back_taken_branches() {
    // First taken BZ lands on a second flag-producing ADD + BZ pair.
    let sim = run_program(
        "MOVC,R1,#0\n\
         ADD,R2,R1,R1\n\
         BZ,#8\n\
         MOVC,R3,#1\n\
         ADD,R4,R1,R1\n\
         BZ,#8\n\
         MOVC,R5,#2\n\
         MOVC,R6,#3\n\
         HALT",
    );
    assert_eq!(sim.architectural_value(3), Some(0));
    assert_eq!(sim.architectural_value(5), Some(0));
    assert_eq!(sim.architectural_value(6), Some(3));
    assert_eq!(sim.machine.stats.branches_taken, 2);
}

#[test]
fn flag_producer_separated_from_branch_by_a_movc() {
    // A MOVC sits between the flag-producing ADD and the branch; the
    // predicate walk must skip it and still observe the ADD's flag.
    let sim = run_program(
        "MOVC,R1,#0\n\
         ADD,R2,R1,R1\n\
         MOVC,R3,#5\n\
         BZ,#8\n\
         MOVC,R4,#111\n\
         MOVC,R5,#222\n\
         HALT",
    );
    assert_eq!(sim.architectural_value(3), Some(5));
    assert_eq!(sim.architectural_value(4), Some(0));
    assert_eq!(sim.architectural_value(5), Some(222));
}

#[test]
fn rename_state_is_fully_restored_after_a_flush() {
    // The wrong path renames R2 twice; after recovery the right path must
    // rename and commit R2 cleanly.
    let sim = run_program(
        "MOVC,R1,#0\n\
         ADD,R2,R1,R1\n\
         BZ,#12\n\
         MOVC,R2,#111\n\
         MOVC,R2,#112\n\
         MOVC,R2,#7\n\
         HALT",
    );
    assert_eq!(sim.architectural_value(2), Some(7));
}

#[test]
fn prediction_table_records_resolved_direction() {
    let mut sim = simulator(
        "MOVC,R1,#1\n\
         BZ,#8\n\
         MOVC,R2,#9\n\
         MOVC,R3,#9\n\
         HALT",
    );
    run_checked(&mut sim);
    // BZ at pc 4004 resolved untaken.
    assert_eq!(sim.pipeline.cfids.last_prediction(4004), Some(false));
}

#[test]
fn backward_branch_forms_a_loop() {
    // R1 counts 3,2,1 via SUBL; BNZ #-4 re-executes the SUBL until the
    // flag sets, then falls through.
    let sim = run_program(
        "MOVC,R1,#3\n\
         SUBL,R1,R1,#1\n\
         BNZ,#-4\n\
         MOVC,R2,#5\n\
         HALT",
    );
    assert_eq!(sim.architectural_value(1), Some(0));
    assert_eq!(sim.architectural_value(2), Some(5));
    assert_eq!(sim.machine.stats.branches_taken, 2);
}
