//! Instruction Disassembler.
//!
//! Renders a decoded [`Instruction`] back into canonical program text for debug
//! tracing, the CLI listing and test diagnostics. Registers are printed as `xN` and
//! targets as absolute `@N` lines, so the output decodes to the same instruction
//! without needing the original label table.
//!
//! # Usage
//!
//! ```
//! use moesim_core::isa::instruction::{AluOp, Instruction};
//! let inst = Instruction::AluImm { op: AluOp::Add, rd: 10, rs1: 0, imm: 10 };
//! assert_eq!(inst.to_string(), "ADDI x10, x0, 10");
//! ```

use std::fmt;

use crate::isa::instruction::Instruction;

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Nop => write!(f, "NOP"),
            Self::Halt => write!(f, "HALT"),
            Self::HartId { rd } => write!(f, "HARTID x{rd}"),
            Self::Mv { rd, rs } => write!(f, "MV x{rd}, x{rs}"),
            Self::Li { rd, imm } => write!(f, "LI x{rd}, {imm}"),
            Self::Alu { op, rd, rs1, rs2 } => {
                write!(f, "{} x{rd}, x{rs1}, x{rs2}", op.mnemonic())
            }
            Self::AluImm { op, rd, rs1, imm } => write!(
                f,
                "{} x{rd}, x{rs1}, {imm}",
                op.imm_mnemonic().unwrap_or("?")
            ),
            Self::Branch {
                cond,
                rs1,
                rs2,
                target,
            } => write!(f, "{} x{rs1}, x{rs2}, @{target}", cond.mnemonic()),
            Self::Jal { rd, target } => write!(f, "JAL x{rd}, @{target}"),
            Self::Jalr { rd, rs1, imm } => write!(f, "JALR x{rd}, x{rs1}, {imm}"),
            Self::Lw { rd, base, offset } => write!(f, "LW x{rd}, {offset}(x{base})"),
            Self::Sw { rs, base, offset } => write!(f, "SW x{rs}, {offset}(x{base})"),
        }
    }
}

/// Renders a whole instruction sequence, one canonical line per instruction.
pub fn listing(instructions: &[Instruction]) -> String {
    let mut out = String::new();
    for inst in instructions {
        out.push_str(&inst.to_string());
        out.push('\n');
    }
    out
}
