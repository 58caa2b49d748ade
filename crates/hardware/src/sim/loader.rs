//! Program Loader.
//!
//! This module turns a whole program text into a [`Program`]. It performs:
//! 1. **Label collection:** A first pass records every `name:` definition by line.
//! 2. **Decoding:** A second pass decodes each line against the finished label table.
//! 3. **Error selection:** The lowest-numbered bad line is reported; nothing is committed.

use tracing::debug;

use crate::common::error::{DecodeError, DecodeErrorKind};
use crate::isa::decode::{Labels, decode_line, split_label};
use crate::isa::disasm;
use crate::isa::instruction::Instruction;

/// A decoded program: one instruction per source line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    instructions: Vec<Instruction>,
    source: Vec<String>,
    labels: Labels,
}

impl Program {
    /// Decoded instructions, indexed by 0-based source line.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Trimmed source text of `line`.
    pub fn source_line(&self, line: usize) -> Option<&str> {
        self.source.get(line).map(String::as_str)
    }

    /// Label table.
    pub const fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Number of lines (and instructions).
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns true for the empty program.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Canonical disassembly, one numbered line per instruction.
    pub fn listing(&self) -> String {
        disasm::listing(&self.instructions)
    }
}

fn error_at(line: usize, text: &str, kind: DecodeErrorKind) -> DecodeError {
    DecodeError {
        line,
        text: text.trim().to_owned(),
        kind,
    }
}

/// Decodes a whole program.
///
/// # Arguments
///
/// * `text` - Program text, one instruction per line.
///
/// # Returns
///
/// The program, or the error on the lowest-numbered bad line.
///
/// # Errors
///
/// Returns a [`DecodeError`] tagged with the offending 0-based line.
pub fn load(text: &str) -> Result<Program, DecodeError> {
    let lines: Vec<&str> = text.lines().collect();
    let len = lines.len();

    let mut labels = Labels::new();
    let mut first_error: Option<DecodeError> = None;
    for (n, line) in lines.iter().enumerate() {
        match split_label(line) {
            Ok((Some(label), _)) => {
                if let Some(&first) = labels.get(label) {
                    let kind = DecodeErrorKind::DuplicateLabel {
                        label: label.to_owned(),
                        first,
                    };
                    first_error = first_error.or_else(|| Some(error_at(n, line, kind)));
                } else {
                    let _ = labels.insert(label.to_owned(), n);
                }
            }
            Ok((None, _)) => {}
            Err(kind) => first_error = first_error.or_else(|| Some(error_at(n, line, kind))),
        }
    }

    let mut instructions = Vec::with_capacity(len);
    for (n, line) in lines.iter().enumerate() {
        if first_error.as_ref().is_some_and(|e| e.line <= n) {
            break;
        }
        match decode_line(line, &labels, len) {
            Ok(inst) => instructions.push(inst),
            Err(kind) => {
                first_error = Some(error_at(n, line, kind));
                break;
            }
        }
    }

    if let Some(err) = first_error {
        debug!(line = err.line, error = %err.kind, "program rejected");
        return Err(err);
    }

    debug!(lines = len, labels = labels.len(), "program decoded");
    Ok(Program {
        instructions,
        source: lines.iter().map(|l| l.trim().to_owned()).collect(),
        labels,
    })
}
