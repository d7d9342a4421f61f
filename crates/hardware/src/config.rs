//! Configuration system for the APEX simulator.
//!
//! This module defines the structures used to parameterize the machine. It
//! provides:
//! 1. **Defaults:** Baseline hardware constants (queue depths, register file
//!    size, unit latencies).
//! 2. **`SimConfig`:** A serde-deserializable configuration record, supplied
//!    as JSON by the CLI or built with `SimConfig::default()`.
//!
//! Every structural constant of the pipeline lives here; components take
//! their sizes from a `SimConfig` at construction and never re-read it.

use serde::Deserialize;

/// Default configuration constants for the simulator.
pub mod defaults {
    /// Number of physical registers in the unified register file.
    pub const URF_SIZE: usize = 40;

    /// Number of architectural registers (R0..R15).
    pub const ARCH_REGS: usize = 16;

    /// Issue queue capacity.
    pub const IQ_SIZE: usize = 16;

    /// Reorder buffer capacity.
    pub const ROB_SIZE: usize = 32;

    /// Load/store queue capacity.
    pub const LSQ_SIZE: usize = 20;

    /// Number of control-flow identifiers. CFIDs are numbered `1..=CFID_SIZE`.
    pub const CFID_SIZE: usize = 7;

    /// Maximum instructions retired from the ROB head per cycle.
    pub const COMMIT_WIDTH: usize = 2;

    /// Cycles a multiply occupies the MUL unit.
    pub const MUL_LATENCY: u64 = 2;

    /// Cycles a memory operation occupies the MEM unit.
    pub const MEM_LATENCY: u64 = 3;

    /// Data memory size in words.
    pub const DATA_MEMORY_WORDS: usize = 4096;

    /// Program counter of the first instruction.
    pub const PC_BASE: u32 = 4000;
}

fn default_urf_size() -> usize {
    defaults::URF_SIZE
}
fn default_arch_regs() -> usize {
    defaults::ARCH_REGS
}
fn default_iq_size() -> usize {
    defaults::IQ_SIZE
}
fn default_rob_size() -> usize {
    defaults::ROB_SIZE
}
fn default_lsq_size() -> usize {
    defaults::LSQ_SIZE
}
fn default_cfid_size() -> usize {
    defaults::CFID_SIZE
}
fn default_commit_width() -> usize {
    defaults::COMMIT_WIDTH
}
fn default_mul_latency() -> u64 {
    defaults::MUL_LATENCY
}
fn default_mem_latency() -> u64 {
    defaults::MEM_LATENCY
}
fn default_data_memory_words() -> usize {
    defaults::DATA_MEMORY_WORDS
}
fn default_pc_base() -> u32 {
    defaults::PC_BASE
}

/// Simulator configuration.
///
/// All fields default to the constants in [`defaults`], so a partial JSON
/// document overrides only the named knobs.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Physical register count in the unified register file.
    #[serde(default = "default_urf_size")]
    pub urf_size: usize,
    /// Architectural register count.
    #[serde(default = "default_arch_regs")]
    pub arch_regs: usize,
    /// Issue queue capacity.
    #[serde(default = "default_iq_size")]
    pub iq_size: usize,
    /// Reorder buffer capacity.
    #[serde(default = "default_rob_size")]
    pub rob_size: usize,
    /// Load/store queue capacity.
    #[serde(default = "default_lsq_size")]
    pub lsq_size: usize,
    /// Control-flow identifier pool size.
    #[serde(default = "default_cfid_size")]
    pub cfid_size: usize,
    /// Retirements allowed per cycle from the ROB head.
    #[serde(default = "default_commit_width")]
    pub commit_width: usize,
    /// Multiply unit occupancy in cycles.
    #[serde(default = "default_mul_latency")]
    pub mul_latency: u64,
    /// Memory unit occupancy in cycles.
    #[serde(default = "default_mem_latency")]
    pub mem_latency: u64,
    /// Data memory size in words.
    #[serde(default = "default_data_memory_words")]
    pub data_memory_words: usize,
    /// Program counter of the first instruction.
    #[serde(default = "default_pc_base")]
    pub pc_base: u32,
    /// Emit per-stage trace lines to stderr.
    #[serde(default)]
    pub trace: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            urf_size: defaults::URF_SIZE,
            arch_regs: defaults::ARCH_REGS,
            iq_size: defaults::IQ_SIZE,
            rob_size: defaults::ROB_SIZE,
            lsq_size: defaults::LSQ_SIZE,
            cfid_size: defaults::CFID_SIZE,
            commit_width: defaults::COMMIT_WIDTH,
            mul_latency: defaults::MUL_LATENCY,
            mem_latency: defaults::MEM_LATENCY,
            data_memory_words: defaults::DATA_MEMORY_WORDS,
            pc_base: defaults::PC_BASE,
            trace: false,
        }
    }
}
