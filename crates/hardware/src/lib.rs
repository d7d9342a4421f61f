//! APEX out-of-order pipeline simulator library.
//!
//! This crate implements a cycle-accurate simulator of a small out-of-order
//! superscalar APEX processor:
//! 1. **Core:** Seven pipeline stages (Fetch, Decode/Rename, Dispatch,
//!    IntFU, MulFU, MemFU, Retire) over a unified register file with
//!    front/back rename tables.
//! 2. **Queues:** Issue queue with bus wakeup, in-order load/store queue,
//!    and a reorder buffer retiring up to two instructions per cycle.
//! 3. **Speculation:** Control-flow identifiers with rename-state snapshots;
//!    a taken branch squashes younger work and restores the snapshot.
//! 4. **Simulation:** [`Simulator`] (owns machine + pipeline), assembly text
//!    loader, configuration, and statistics.

/// Simulator configuration (defaults and the `SimConfig` record).
pub mod config;
/// CPU core: architectural state and the pipeline.
pub mod core;
/// Instruction set (opcodes, decoded instructions, FU classification).
pub mod isa;
/// Simulation: `Simulator`, loader, driver surface.
pub mod sim;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; `SimConfig::default()` or deserialize from JSON.
pub use crate::config::SimConfig;
/// Architectural machine state.
pub use crate::core::Machine;
/// Top-level simulator; owns the machine and pipeline side-by-side.
pub use crate::sim::simulator::Simulator;
