//! Simulator error definitions.
//!
//! This module defines every failure the simulator can report. It provides:
//! 1. **Decode Errors:** Malformed program text, tagged with the offending source line.
//! 2. **Execution Errors:** Out-of-range program counters and addresses, misaligned accesses, halts.
//! 3. **Protocol Violations:** Internal coherence invariant breaches, kept distinct from user errors.
//! 4. **Classification:** A stable `ErrorKind` with numeric codes for the foreign-function boundary.

use thiserror::Error;

use super::addr::LineAddr;
use super::constants::MEM_BYTES;

/// What is wrong with a single line of program text.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DecodeErrorKind {
    /// The first word of the line is not a known mnemonic.
    #[error("unknown mnemonic `{0}`")]
    UnknownMnemonic(String),

    /// The mnemonic is known but got the wrong number of operands.
    #[error("`{mnemonic}` expects {expected} operand(s), found {found}")]
    Arity {
        /// Mnemonic as written in the source.
        mnemonic: String,
        /// Operand count the mnemonic requires.
        expected: usize,
        /// Operand count found on the line.
        found: usize,
    },

    /// An operand that should name a register does not.
    #[error("unknown register `{0}`")]
    BadRegister(String),

    /// An immediate is not a decimal or `0x` hex number that fits in 32 bits.
    #[error("malformed immediate `{0}`")]
    BadImmediate(String),

    /// A load/store address operand is not of the form `offset(base)`.
    #[error("malformed memory operand `{0}`, expected `offset(base)`")]
    BadMemOperand(String),

    /// A label definition or reference is not a valid identifier.
    #[error("malformed label `{0}`")]
    BadLabel(String),

    /// A branch or jump names a label that is never defined.
    #[error("unknown label `{0}`")]
    UnknownLabel(String),

    /// A label is defined more than once.
    #[error("label `{label}` already defined on line {first}")]
    DuplicateLabel {
        /// The repeated label.
        label: String,
        /// Line of the first definition.
        first: usize,
    },

    /// An absolute `@N` target names a line past the end of the program.
    #[error("target line {target} is outside the program ({len} lines)")]
    TargetOutOfRange {
        /// Requested target line.
        target: usize,
        /// Number of lines in the program.
        len: usize,
    },
}

/// A decode failure tagged with its 0-based source line.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("line {line}: {kind} in `{text}`")]
pub struct DecodeError {
    /// 0-based line number of the offending line.
    pub line: usize,
    /// Trimmed source text of the offending line.
    pub text: String,
    /// What is wrong with it.
    pub kind: DecodeErrorKind,
}

/// Every error the simulator reports through its debug interface.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SimError {
    /// The program text could not be decoded; the previous program stays loaded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// An agent's program counter does not index an instruction.
    #[error("agent {agent}: program counter {pc} is outside the program ({len} lines)")]
    PcOutOfBounds {
        /// Executing agent.
        agent: usize,
        /// Offending program counter.
        pc: usize,
        /// Number of lines in the program.
        len: usize,
    },

    /// A load or store addressed memory outside the image.
    #[error("agent {agent}, line {pc} `{text}`: address {addr:#x} is outside the {size}-byte memory", size = MEM_BYTES)]
    AddressOutOfBounds {
        /// Executing agent.
        agent: usize,
        /// Line of the faulting instruction.
        pc: usize,
        /// Source text of the faulting instruction.
        text: String,
        /// Effective address.
        addr: u32,
    },

    /// A load or store used an address that is not word aligned.
    #[error("agent {agent}, line {pc} `{text}`: misaligned word access at {addr:#x}")]
    Misaligned {
        /// Executing agent.
        agent: usize,
        /// Line of the faulting instruction.
        pc: usize,
        /// Source text of the faulting instruction.
        text: String,
        /// Effective address.
        addr: u32,
    },

    /// Every agent has executed `HALT`; the machine must be reset.
    #[error("machine is halted; reset to run again")]
    Halted,

    /// The coherence protocol broke one of its own invariants. This is a simulator bug.
    #[error("coherence protocol violation on line {line}: {detail}")]
    ProtocolViolation {
        /// Line whose state is inconsistent.
        line: LineAddr,
        /// Description of the broken invariant.
        detail: String,
    },
}

/// Coarse classification of a [`SimError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad program text.
    Decode,
    /// Program counter or memory address out of range.
    Bounds,
    /// Misaligned word access.
    Alignment,
    /// Operation attempted after the machine halted.
    Halted,
    /// Internal coherence invariant breach.
    ProtocolViolation,
}

impl ErrorKind {
    /// Stable numeric code used across the foreign-function boundary (0 means "no error").
    pub const fn code(self) -> u32 {
        match self {
            Self::Decode => 1,
            Self::Bounds => 2,
            Self::Alignment => 3,
            Self::Halted => 4,
            Self::ProtocolViolation => 5,
        }
    }

    /// Returns true if the user can fix the cause and retry without a reset.
    pub const fn is_recoverable(self) -> bool {
        matches!(self, Self::Decode | Self::Bounds | Self::Alignment)
    }
}

impl SimError {
    /// Classifies this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode(_) => ErrorKind::Decode,
            Self::PcOutOfBounds { .. } | Self::AddressOutOfBounds { .. } => ErrorKind::Bounds,
            Self::Misaligned { .. } => ErrorKind::Alignment,
            Self::Halted => ErrorKind::Halted,
            Self::ProtocolViolation { .. } => ErrorKind::ProtocolViolation,
        }
    }

    /// Builds a protocol violation for `line`.
    pub fn violation(line: LineAddr, detail: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            line,
            detail: detail.into(),
        }
    }

    /// Attaches the source text of the faulting line to a memory fault; other errors
    /// are returned unchanged.
    #[must_use]
    pub fn with_source(mut self, source: &str) -> Self {
        if let Self::AddressOutOfBounds { text, .. } | Self::Misaligned { text, .. } = &mut self {
            source.clone_into(text);
        }
        self
    }

    /// Returns the program line of the failing instruction, when there is one.
    pub const fn pc(&self) -> Option<usize> {
        match self {
            Self::PcOutOfBounds { .. } | Self::Halted | Self::ProtocolViolation { .. } => None,
            Self::Decode(e) => Some(e.line),
            Self::AddressOutOfBounds { pc, .. } | Self::Misaligned { pc, .. } => Some(*pc),
        }
    }
}
