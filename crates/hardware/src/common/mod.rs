//! Common utilities and types used throughout the simulator.
//!
//! This module provides fundamental building blocks that are shared across all components
//! of the simulator. It includes:
//! 1. **Address Types:** Strong types for word and line addresses.
//! 2. **Constants:** Fixed register, memory and line geometry.
//! 3. **Error Handling:** Decode, execution and protocol error types.
//! 4. **Register Management:** The per-agent register file.

/// Word and line address types.
pub mod addr;

/// Machine geometry constants.
pub mod constants;

/// Error types and their classification.
pub mod error;

/// Register file implementation.
pub mod reg;

pub use addr::{AddrFault, LineAddr, WordAddr};
pub use constants::{LINE_BYTES, MEM_BYTES, MEM_WORDS, NUM_LINES, NUM_REGS, WORDS_PER_LINE};
pub use error::{DecodeError, DecodeErrorKind, ErrorKind, SimError};
pub use reg::RegisterFile;
