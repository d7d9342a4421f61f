//! Assembly text loader.
//!
//! Parses APEX assembly, one instruction per line, into the decoded form the
//! pipeline consumes. Operands are comma- or whitespace-separated; `;`
//! starts a comment. Program counters are assigned sequentially from the
//! configured base in strides of 4:
//!
//! ```text
//! MOVC,R1,#10
//! ADD R3,R1,R2     ; whitespace form is accepted too
//! STORE,R1,R2,#4
//! BZ,#8
//! HALT
//! ```

use crate::config::defaults;
use crate::isa::{Instruction, Opcode};
use std::path::Path;
use thiserror::Error;

/// Errors produced while loading a program.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The source file could not be read.
    #[error("cannot read program: {0}")]
    Io(#[from] std::io::Error),

    /// A mnemonic is not part of the APEX instruction set.
    #[error("line {line}: unknown opcode `{mnemonic}`")]
    UnknownOpcode {
        /// 1-based source line.
        line: usize,
        /// The offending mnemonic.
        mnemonic: String,
    },

    /// An operand is missing, malformed, or of the wrong kind.
    #[error("line {line}: {message}")]
    Operand {
        /// 1-based source line.
        line: usize,
        /// What was expected.
        message: String,
    },

    /// A register operand is outside the architectural register file.
    #[error("line {line}: register R{register} out of range (R0..R{max})")]
    RegisterRange {
        /// 1-based source line.
        line: usize,
        /// The offending register number.
        register: usize,
        /// Highest valid register number.
        max: usize,
    },
}

/// Loads and parses a program file.
pub fn load_program<P: AsRef<Path>>(path: P) -> Result<Vec<Instruction>, LoadError> {
    let source = std::fs::read_to_string(path)?;
    let program = parse_program(&source)?;
    tracing::info!(instructions = program.len(), "program loaded");
    Ok(program)
}

/// Parses program text into decoded instructions.
pub fn parse_program(source: &str) -> Result<Vec<Instruction>, LoadError> {
    let mut program = Vec::new();
    for (idx, raw_line) in source.lines().enumerate() {
        let line = idx + 1;
        let text = raw_line.split(';').next().unwrap_or("").trim();
        if text.is_empty() {
            continue;
        }
        let pc = defaults::PC_BASE + 4 * program.len() as u32;
        program.push(parse_line(text, line, pc)?);
    }
    Ok(program)
}

fn parse_line(text: &str, line: usize, pc: u32) -> Result<Instruction, LoadError> {
    let mut tokens = text.split([',', ' ', '\t']).filter(|t| !t.is_empty());
    let mnemonic = tokens.next().unwrap_or("").to_ascii_uppercase();
    let opcode: Opcode = mnemonic
        .parse()
        .map_err(|()| LoadError::UnknownOpcode {
            line,
            mnemonic: mnemonic.clone(),
        })?;
    let operands: Vec<&str> = tokens.collect();

    let mut inst = Instruction::nop(pc);
    inst.opcode = opcode;

    match opcode {
        Opcode::Movc => {
            expect_arity(&operands, 2, line)?;
            inst.rd = register(operands[0], line)?;
            inst.imm = literal(operands[1], line)?;
        }
        Opcode::Add | Opcode::Sub | Opcode::And | Opcode::Or | Opcode::Exor | Opcode::Mul => {
            expect_arity(&operands, 3, line)?;
            inst.rd = register(operands[0], line)?;
            inst.rs1 = register(operands[1], line)?;
            inst.rs2 = register(operands[2], line)?;
        }
        Opcode::Addl | Opcode::Subl | Opcode::Load | Opcode::Jal => {
            expect_arity(&operands, 3, line)?;
            inst.rd = register(operands[0], line)?;
            inst.rs1 = register(operands[1], line)?;
            inst.imm = literal(operands[2], line)?;
        }
        Opcode::Store => {
            expect_arity(&operands, 3, line)?;
            inst.rs1 = register(operands[0], line)?;
            inst.rs2 = register(operands[1], line)?;
            inst.imm = literal(operands[2], line)?;
        }
        Opcode::Bz | Opcode::Bnz => {
            expect_arity(&operands, 1, line)?;
            inst.imm = literal(operands[0], line)?;
        }
        Opcode::Jump => {
            expect_arity(&operands, 2, line)?;
            inst.rs1 = register(operands[0], line)?;
            inst.imm = literal(operands[1], line)?;
        }
        Opcode::Halt | Opcode::Nop => {
            expect_arity(&operands, 0, line)?;
        }
    }
    Ok(inst)
}

fn expect_arity(operands: &[&str], want: usize, line: usize) -> Result<(), LoadError> {
    if operands.len() == want {
        Ok(())
    } else {
        Err(LoadError::Operand {
            line,
            message: format!("expected {} operand(s), found {}", want, operands.len()),
        })
    }
}

fn register(token: &str, line: usize) -> Result<usize, LoadError> {
    let number = token
        .strip_prefix(['R', 'r'])
        .and_then(|n| n.parse::<usize>().ok())
        .ok_or_else(|| LoadError::Operand {
            line,
            message: format!("expected a register, found `{token}`"),
        })?;
    if number >= defaults::ARCH_REGS {
        return Err(LoadError::RegisterRange {
            line,
            register: number,
            max: defaults::ARCH_REGS - 1,
        });
    }
    Ok(number)
}

fn literal(token: &str, line: usize) -> Result<i32, LoadError> {
    token
        .strip_prefix('#')
        .and_then(|n| n.parse::<i32>().ok())
        .ok_or_else(|| LoadError::Operand {
            line,
            message: format!("expected a literal like #8, found `{token}`"),
        })
}
