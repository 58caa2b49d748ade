//! Textual Instruction Decoder.
//!
//! This module turns one line of program text into an [`Instruction`]. A line has the
//! shape
//!
//! ```text
//! [label:] [MNEMONIC operand, operand, ...] [# comment | ; comment]
//! ```
//!
//! Mnemonics and register names are case-insensitive. Immediates are decimal or `0x`
//! hex with an optional sign. Branch and jump targets are a label or `@N`, an absolute
//! 0-based line. Memory operands are written `offset(base)`.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::common::error::DecodeErrorKind;
use crate::isa::abi::parse_reg;
use crate::isa::instruction::{AluOp, BranchCond, Instruction};

/// Label table of a program: label name to 0-based line.
pub type Labels = BTreeMap<String, usize>;

/// Compiled line grammar.
struct Grammar {
    /// `[label:] code [# comment | ; comment]`; the label ends at the first colon
    /// ahead of any comment.
    line: Regex,
    /// `MNEMONIC [operands]`.
    instruction: Regex,
    /// Operand separator.
    separator: Regex,
    /// Label identifier.
    ident: Regex,
    /// Signed decimal or `0x` hex immediate.
    imm: Regex,
    /// `offset(base)` memory operand.
    mem: Regex,
    /// `@N` absolute line target.
    line_target: Regex,
}

#[allow(clippy::expect_used)]
fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("grammar patterns are literals")
}

static GRAMMAR: LazyLock<Grammar> = LazyLock::new(|| Grammar {
    line: pattern(r"^(?:(?P<label>[^:#;]*):)?(?P<code>[^#;]*)"),
    instruction: pattern(r"^(?P<mnemonic>\S+)(?:\s+(?P<operands>.*))?$"),
    separator: pattern(r"\s*,\s*"),
    ident: pattern(r"^[A-Za-z_][A-Za-z0-9_]*$"),
    imm: pattern(r"^(?P<sign>[+-])?(?:0[xX](?P<hex>[0-9A-Fa-f]+)|(?P<dec>[0-9]+))$"),
    mem: pattern(r"^(?P<offset>[^(]*)\((?P<base>.*)\)$"),
    line_target: pattern(r"^@(?P<line>[0-9]+)$"),
});

/// Returns true if `name` is a valid label identifier.
fn is_ident(name: &str) -> bool {
    GRAMMAR.ident.is_match(name)
}

/// Splits an optional `label:` prefix off a line and drops any comment.
///
/// # Arguments
///
/// * `line` - A source line, with or without a comment.
///
/// # Returns
///
/// The label (if any) and the remaining instruction text, both trimmed.
pub fn split_label(line: &str) -> Result<(Option<&str>, &str), DecodeErrorKind> {
    let Some(caps) = GRAMMAR.line.captures(line) else {
        return Ok((None, ""));
    };
    let code = caps.name("code").map_or("", |m| m.as_str().trim());
    match caps.name("label") {
        Some(label) if is_ident(label.as_str().trim()) => Ok((Some(label.as_str().trim()), code)),
        Some(label) => Err(DecodeErrorKind::BadLabel(label.as_str().trim().to_owned())),
        None => Ok((None, code)),
    }
}

/// Parses a signed decimal or `0x` hex immediate that fits in 32 bits.
///
/// Values from `i32::MIN` up to `u32::MAX` are accepted; values above `i32::MAX`
/// keep their bit pattern.
pub fn parse_imm(text: &str) -> Result<i32, DecodeErrorKind> {
    let bad = || DecodeErrorKind::BadImmediate(text.to_owned());
    let caps = GRAMMAR.imm.captures(text).ok_or_else(bad)?;
    let (radix, body) = match (caps.name("hex"), caps.name("dec")) {
        (Some(hex), _) => (16, hex.as_str()),
        (None, Some(dec)) => (10, dec.as_str()),
        (None, None) => return Err(bad()),
    };
    let magnitude = i64::from_str_radix(body, radix).map_err(|_| bad())?;
    let negative = caps.name("sign").is_some_and(|m| m.as_str() == "-");
    let value = if negative { -magnitude } else { magnitude };
    if value < i64::from(i32::MIN) || value > i64::from(u32::MAX) {
        return Err(bad());
    }
    Ok(value as i32)
}

/// Parses a register operand.
fn reg(text: &str) -> Result<usize, DecodeErrorKind> {
    parse_reg(text).ok_or_else(|| DecodeErrorKind::BadRegister(text.to_owned()))
}

/// Parses an `offset(base)` memory operand; an empty offset means 0.
fn mem_operand(text: &str) -> Result<(i32, usize), DecodeErrorKind> {
    let caps = GRAMMAR
        .mem
        .captures(text)
        .ok_or_else(|| DecodeErrorKind::BadMemOperand(text.to_owned()))?;
    let offset = caps.name("offset").map_or("", |m| m.as_str().trim());
    let base = caps.name("base").map_or("", |m| m.as_str().trim());
    let offset = if offset.is_empty() { 0 } else { parse_imm(offset)? };
    Ok((offset, reg(base)?))
}

/// Resolves a branch or jump target against the label table.
fn target(text: &str, labels: &Labels, len: usize) -> Result<usize, DecodeErrorKind> {
    if let Some(caps) = GRAMMAR.line_target.captures(text) {
        let line = caps
            .name("line")
            .and_then(|m| m.as_str().parse::<usize>().ok())
            .ok_or_else(|| DecodeErrorKind::BadLabel(text.to_owned()))?;
        return if line < len {
            Ok(line)
        } else {
            Err(DecodeErrorKind::TargetOutOfRange { target: line, len })
        };
    }
    if !is_ident(text) {
        return Err(DecodeErrorKind::BadLabel(text.to_owned()));
    }
    labels
        .get(text)
        .copied()
        .ok_or_else(|| DecodeErrorKind::UnknownLabel(text.to_owned()))
}

/// Looks up a register-form ALU mnemonic.
fn alu_op(mnemonic: &str) -> Option<AluOp> {
    if mnemonic == "SLR" {
        return Some(AluOp::Srl);
    }
    AluOp::ALL.into_iter().find(|op| op.mnemonic() == mnemonic)
}

/// Looks up an immediate-form ALU mnemonic.
fn alu_imm_op(mnemonic: &str) -> Option<AluOp> {
    if mnemonic == "SLRI" {
        return Some(AluOp::Srl);
    }
    AluOp::ALL
        .into_iter()
        .find(|op| op.imm_mnemonic() == Some(mnemonic))
}

/// Looks up a branch mnemonic.
fn branch_cond(mnemonic: &str) -> Option<BranchCond> {
    BranchCond::ALL
        .into_iter()
        .find(|cond| cond.mnemonic() == mnemonic)
}

/// Decodes one line of program text.
///
/// A leading `label:` is skipped (labels are collected separately by the loader);
/// lines with no instruction decode to [`Instruction::Nop`].
///
/// # Arguments
///
/// * `line` - The source line.
/// * `labels` - Label table used to resolve branch and jump targets.
/// * `len` - Number of lines in the program, bounding `@N` targets.
///
/// # Returns
///
/// The decoded instruction, or what is wrong with the line.
pub fn decode_line(line: &str, labels: &Labels, len: usize) -> Result<Instruction, DecodeErrorKind> {
    let (_, code) = split_label(line)?;
    if code.is_empty() {
        return Ok(Instruction::Nop);
    }

    let Some(caps) = GRAMMAR.instruction.captures(code) else {
        return Ok(Instruction::Nop);
    };
    let mnemonic = caps.name("mnemonic").map_or("", |m| m.as_str());
    let rest = caps.name("operands").map_or("", |m| m.as_str().trim());
    let upper = mnemonic.to_ascii_uppercase();
    let ops: Vec<&str> = if rest.is_empty() {
        Vec::new()
    } else {
        GRAMMAR.separator.split(rest).collect()
    };

    let arity = |expected: usize| {
        if ops.len() == expected {
            Ok(())
        } else {
            Err(DecodeErrorKind::Arity {
                mnemonic: mnemonic.to_owned(),
                expected,
                found: ops.len(),
            })
        }
    };

    let inst = match upper.as_str() {
        "NOP" => {
            arity(0)?;
            Instruction::Nop
        }
        "HALT" => {
            arity(0)?;
            Instruction::Halt
        }
        "HARTID" => {
            arity(1)?;
            Instruction::HartId { rd: reg(ops[0])? }
        }
        "MV" => {
            arity(2)?;
            Instruction::Mv {
                rd: reg(ops[0])?,
                rs: reg(ops[1])?,
            }
        }
        "LI" => {
            arity(2)?;
            Instruction::Li {
                rd: reg(ops[0])?,
                imm: parse_imm(ops[1])?,
            }
        }
        "JAL" => {
            arity(2)?;
            Instruction::Jal {
                rd: reg(ops[0])?,
                target: target(ops[1], labels, len)?,
            }
        }
        "JALR" => {
            arity(3)?;
            Instruction::Jalr {
                rd: reg(ops[0])?,
                rs1: reg(ops[1])?,
                imm: parse_imm(ops[2])?,
            }
        }
        "LW" => {
            arity(2)?;
            let (offset, base) = mem_operand(ops[1])?;
            Instruction::Lw {
                rd: reg(ops[0])?,
                base,
                offset,
            }
        }
        "SW" => {
            arity(2)?;
            let (offset, base) = mem_operand(ops[1])?;
            Instruction::Sw {
                rs: reg(ops[0])?,
                base,
                offset,
            }
        }
        other => {
            if let Some(op) = alu_op(other) {
                arity(3)?;
                Instruction::Alu {
                    op,
                    rd: reg(ops[0])?,
                    rs1: reg(ops[1])?,
                    rs2: reg(ops[2])?,
                }
            } else if let Some(op) = alu_imm_op(other) {
                arity(3)?;
                Instruction::AluImm {
                    op,
                    rd: reg(ops[0])?,
                    rs1: reg(ops[1])?,
                    imm: parse_imm(ops[2])?,
                }
            } else if let Some(cond) = branch_cond(other) {
                arity(3)?;
                Instruction::Branch {
                    cond,
                    rs1: reg(ops[0])?,
                    rs2: reg(ops[1])?,
                    target: target(ops[2], labels, len)?,
                }
            } else {
                return Err(DecodeErrorKind::UnknownMnemonic(mnemonic.to_owned()));
            }
        }
    };
    Ok(inst)
}
