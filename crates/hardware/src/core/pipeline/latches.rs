//! Pipeline latch structures for inter-stage communication.
//!
//! Latches are `Option`-valued: an empty latch is `None`, and a stage stalls
//! simply by leaving its output latch occupied. The front-end latches carry:
//! 1. **Fetch → Decode:** The raw decoded [`Instruction`].
//! 2. **Decode → Dispatch:** The instruction plus its renamed registers and
//!    control-flow tag ([`RenamedEntry`]).
//! 3. **Function unit stations:** Multi-cycle occupancy records for the MUL
//!    and MEM units.

use crate::core::pipeline::cfid::Cfid;
use crate::core::pipeline::iq::IqEntry;
use crate::core::pipeline::urf::PhysReg;
use crate::isa::{FuType, Instruction};

/// Output of decode/rename, consumed by dispatch.
#[derive(Clone, Copy, Debug)]
pub struct RenamedEntry {
    /// The decoded instruction.
    pub inst: Instruction,
    /// Function unit classification.
    pub fu: FuType,
    /// Renamed destination, if the opcode writes a register.
    pub dest: Option<PhysReg>,
    /// Renamed first source (store data for STORE).
    pub src1: Option<PhysReg>,
    /// Renamed second source (address base for STORE).
    pub src2: Option<PhysReg>,
    /// Guarding control-flow identifier (a branch's own, freshly allocated).
    pub cfid: Option<Cfid>,
}

/// Occupancy record for the two-cycle multiply unit.
#[derive(Clone, Copy, Debug)]
pub struct MulStation {
    /// The issued multiply.
    pub entry: IqEntry,
    /// Cycles spent so far.
    pub cycles: u64,
}

/// Occupancy record for the three-cycle memory unit, tracking the LSQ head.
#[derive(Clone, Copy, Debug)]
pub struct MemStation {
    /// LSQ slot of the operation being processed.
    pub lsq_slot: usize,
    /// PC of the operation; guards against slot reuse after a flush.
    pub pc: u32,
    /// Cycles spent so far.
    pub cycles: u64,
}
