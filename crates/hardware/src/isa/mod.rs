//! APEX instruction set definitions.
//!
//! This module provides the decoded representation the pipeline consumes:
//! 1. **Opcode:** Enumerated operation tags with the single mnemonic decode site.
//! 2. **Instruction:** The decoded record (opcode, registers, literal, PC).
//! 3. **Function units:** Classification of each opcode onto INT/MUL/LS units.

/// Opcode and instruction record definitions.
pub mod instruction;

pub use instruction::{FuType, Instruction, Opcode};
