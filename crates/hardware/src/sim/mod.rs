//! Simulation surface: program loading and the top-level driver.

/// Assembly text loader.
pub mod loader;
/// Top-level simulator owning the machine and pipeline.
pub mod simulator;

pub use loader::{LoadError, load_program, parse_program};
pub use simulator::{DisplayMode, Simulator};
