//! Global System Constants.
//!
//! This module defines the fixed geometry of the simulated machine. It includes:
//! 1. **Register Constants:** Width and count of the general-purpose register file.
//! 2. **Memory Constants:** Size of the backing store and the coherence line geometry.
//! 3. **Agent Constants:** Bounds on the number of agents and per-agent cache slots.

/// Number of general-purpose registers per agent.
pub const NUM_REGS: usize = 32;

/// Size of the shared memory image in bytes.
pub const MEM_BYTES: usize = 512;

/// Size of one machine word in bytes.
pub const WORD_BYTES: usize = 4;

/// Number of 32-bit words in the memory image.
pub const MEM_WORDS: usize = MEM_BYTES / WORD_BYTES;

/// Size of a coherence line in bytes.
pub const LINE_BYTES: usize = 64;

/// Number of 32-bit words in one coherence line.
pub const WORDS_PER_LINE: usize = LINE_BYTES / WORD_BYTES;

/// Number of coherence lines covering the memory image.
pub const NUM_LINES: usize = MEM_BYTES / LINE_BYTES;

/// Mask clearing the byte-within-line bits of an address.
pub const LINE_MASK: u32 = !(LINE_BYTES as u32 - 1);

/// Largest supported number of agents.
pub const MAX_AGENTS: usize = 8;

/// Largest useful per-agent cache capacity; a cache of this size holds the whole image.
pub const MAX_CACHE_LINES: usize = NUM_LINES;
