//! Decoded APEX instructions.
//!
//! Every mnemonic in the APEX assembly language maps onto one [`Opcode`]
//! variant here; this is the only place raw mnemonic strings are interpreted.
//! The pipeline itself works exclusively with the enumerated tag.

use std::fmt;
use std::str::FromStr;

/// Enumerated APEX operation codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Move a literal into a register.
    Movc,
    /// Register-register addition.
    Add,
    /// Register-register subtraction.
    Sub,
    /// Register-literal addition.
    Addl,
    /// Register-literal subtraction.
    Subl,
    /// Bitwise AND.
    And,
    /// Bitwise OR.
    Or,
    /// Bitwise exclusive OR (mnemonic `EX-OR`).
    Exor,
    /// Multiplication; executes on the dedicated multiply unit.
    Mul,
    /// Load a word from data memory at `rs1 + imm`.
    Load,
    /// Store `rs1` to data memory at `rs2 + imm`.
    Store,
    /// Branch to `pc + imm` when the zero flag is set.
    Bz,
    /// Branch to `pc + imm` when the zero flag is clear.
    Bnz,
    /// Unconditional jump to `rs1 + imm`.
    Jump,
    /// Jump to `rs1 + imm`, writing the return address `pc + 4` to `rd`.
    Jal,
    /// Terminate the program once all older work has retired.
    Halt,
    /// No operation.
    Nop,
}

/// Function unit classification for issue-queue selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FuType {
    /// Integer unit: arithmetic, logic, MOVC, and all control flow.
    Int,
    /// Two-cycle multiply unit.
    Mul,
    /// Load/store unit: address generation for memory operations.
    Ls,
}

impl Opcode {
    /// The function unit this opcode issues to.
    pub fn fu_type(self) -> FuType {
        match self {
            Opcode::Mul => FuType::Mul,
            Opcode::Load | Opcode::Store => FuType::Ls,
            _ => FuType::Int,
        }
    }

    /// True for the speculative control-flow opcodes that allocate a CFID.
    pub fn is_control_flow(self) -> bool {
        matches!(self, Opcode::Bz | Opcode::Bnz | Opcode::Jump | Opcode::Jal)
    }

    /// True for LOAD and STORE.
    pub fn is_memory(self) -> bool {
        matches!(self, Opcode::Load | Opcode::Store)
    }

    /// True when the opcode writes an architectural destination register.
    pub fn writes_register(self) -> bool {
        matches!(
            self,
            Opcode::Movc
                | Opcode::Add
                | Opcode::Sub
                | Opcode::Addl
                | Opcode::Subl
                | Opcode::And
                | Opcode::Or
                | Opcode::Exor
                | Opcode::Mul
                | Opcode::Load
                | Opcode::Jal
        )
    }

    /// True when the result of this opcode drives the zero flag.
    ///
    /// MOVC and LOAD write registers but do not produce a flag, matching the
    /// reference pipeline where only arithmetic results (and the JAL link
    /// value) feed branch predicates.
    pub fn sets_zero_flag(self) -> bool {
        matches!(
            self,
            Opcode::Add
                | Opcode::Sub
                | Opcode::Addl
                | Opcode::Subl
                | Opcode::And
                | Opcode::Or
                | Opcode::Exor
                | Opcode::Mul
                | Opcode::Jal
        )
    }

    /// Canonical assembly mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Movc => "MOVC",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Addl => "ADDL",
            Opcode::Subl => "SUBL",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Exor => "EX-OR",
            Opcode::Mul => "MUL",
            Opcode::Load => "LOAD",
            Opcode::Store => "STORE",
            Opcode::Bz => "BZ",
            Opcode::Bnz => "BNZ",
            Opcode::Jump => "JUMP",
            Opcode::Jal => "JAL",
            Opcode::Halt => "HALT",
            Opcode::Nop => "NOP",
        }
    }
}

impl FromStr for Opcode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MOVC" => Ok(Opcode::Movc),
            "ADD" => Ok(Opcode::Add),
            "SUB" => Ok(Opcode::Sub),
            "ADDL" => Ok(Opcode::Addl),
            "SUBL" => Ok(Opcode::Subl),
            "AND" => Ok(Opcode::And),
            "OR" => Ok(Opcode::Or),
            "EX-OR" | "EXOR" | "XOR" => Ok(Opcode::Exor),
            "MUL" => Ok(Opcode::Mul),
            "LOAD" => Ok(Opcode::Load),
            "STORE" => Ok(Opcode::Store),
            "BZ" => Ok(Opcode::Bz),
            "BNZ" => Ok(Opcode::Bnz),
            "JUMP" => Ok(Opcode::Jump),
            "JAL" => Ok(Opcode::Jal),
            "HALT" => Ok(Opcode::Halt),
            "NOP" => Ok(Opcode::Nop),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A decoded APEX instruction.
///
/// Register fields that an opcode does not use are left at 0 by the loader
/// and ignored by the pipeline; the opcode tag alone decides which fields
/// are live.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction {
    /// Operation tag.
    pub opcode: Opcode,
    /// Architectural destination register.
    pub rd: usize,
    /// First architectural source register.
    pub rs1: usize,
    /// Second architectural source register.
    pub rs2: usize,
    /// Literal value.
    pub imm: i32,
    /// Program counter assigned at load time (4000-series, stride 4).
    pub pc: u32,
}

impl Instruction {
    /// A NOP pinned at the given program counter.
    pub fn nop(pc: u32) -> Self {
        Self {
            opcode: Opcode::Nop,
            rd: 0,
            rs1: 0,
            rs2: 0,
            imm: 0,
            pc,
        }
    }
}

impl fmt::Display for Instruction {
    /// Renders the instruction in loader syntax, used by trace output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.opcode {
            Opcode::Movc => write!(f, "MOVC,R{},#{}", self.rd, self.imm),
            Opcode::Add | Opcode::Sub | Opcode::And | Opcode::Or | Opcode::Exor | Opcode::Mul => {
                write!(
                    f,
                    "{},R{},R{},R{}",
                    self.opcode, self.rd, self.rs1, self.rs2
                )
            }
            Opcode::Addl | Opcode::Subl => {
                write!(f, "{},R{},R{},#{}", self.opcode, self.rd, self.rs1, self.imm)
            }
            Opcode::Load => write!(f, "LOAD,R{},R{},#{}", self.rd, self.rs1, self.imm),
            Opcode::Store => write!(f, "STORE,R{},R{},#{}", self.rs1, self.rs2, self.imm),
            Opcode::Bz | Opcode::Bnz => write!(f, "{},#{}", self.opcode, self.imm),
            Opcode::Jump => write!(f, "JUMP,R{},#{}", self.rs1, self.imm),
            Opcode::Jal => write!(f, "JAL,R{},R{},#{}", self.rd, self.rs1, self.imm),
            Opcode::Halt | Opcode::Nop => write!(f, "{}", self.opcode),
        }
    }
}
