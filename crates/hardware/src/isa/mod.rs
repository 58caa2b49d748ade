//! Instruction set: typed instructions, the text decoder, register naming and the
//! disassembler.

/// Register naming (`xN`, `rN`, ABI names).
pub mod abi;
/// Text to instruction decoding.
pub mod decode;
/// Instruction to text rendering.
pub mod disasm;
/// Decoded instruction types.
pub mod instruction;

pub use decode::{Labels, decode_line};
pub use instruction::{AluOp, BranchCond, InstClass, Instruction};
