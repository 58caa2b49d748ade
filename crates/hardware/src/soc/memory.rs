//! Memory Backing Store.
//!
//! This module implements the 512-byte memory image beneath all caches. It provides:
//! 1. **Storage:** Byte-addressable backing bytes, little-endian word view.
//! 2. **Line Transfers:** Whole-line fills and write-backs used by the coherence bus.
//! 3. **Snapshots:** Word-granular copies for the debug interface.
//!
//! The image is owned by the coherence bus; nothing else holds a reference to it.

use crate::common::addr::{LineAddr, WordAddr};
use crate::common::constants::{LINE_BYTES, MEM_BYTES, MEM_WORDS, WORD_BYTES, WORDS_PER_LINE};

/// Data of one coherence line as sixteen words.
pub type LineData = [u32; WORDS_PER_LINE];

/// The shared 512-byte memory image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryImage {
    bytes: [u8; MEM_BYTES],
}

impl Default for MemoryImage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryImage {
    /// Creates a zero-filled memory image.
    pub const fn new() -> Self {
        Self {
            bytes: [0; MEM_BYTES],
        }
    }

    /// Reads a little-endian word at a validated address.
    pub fn read_u32(&self, addr: WordAddr) -> u32 {
        let base = addr.val() as usize;
        let mut word = [0u8; WORD_BYTES];
        word.copy_from_slice(&self.bytes[base..base + WORD_BYTES]);
        u32::from_le_bytes(word)
    }

    /// Writes a little-endian word at a validated address.
    pub fn write_u32(&mut self, addr: WordAddr, val: u32) {
        let base = addr.val() as usize;
        self.bytes[base..base + WORD_BYTES].copy_from_slice(&val.to_le_bytes());
    }

    /// Reads a whole line as sixteen words.
    pub fn read_line(&self, line: LineAddr) -> LineData {
        let base = line.val() as usize;
        let mut data = [0u32; WORDS_PER_LINE];
        for (i, chunk) in self.bytes[base..base + LINE_BYTES]
            .chunks_exact(WORD_BYTES)
            .enumerate()
        {
            data[i] = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        data
    }

    /// Overwrites a whole line.
    pub fn write_line(&mut self, line: LineAddr, data: &LineData) {
        let base = line.val() as usize;
        for (i, word) in data.iter().enumerate() {
            let at = base + i * WORD_BYTES;
            self.bytes[at..at + WORD_BYTES].copy_from_slice(&word.to_le_bytes());
        }
    }

    /// Returns the image as 128 little-endian words in address order.
    pub fn words(&self) -> [u32; MEM_WORDS] {
        let mut out = [0u32; MEM_WORDS];
        for line in LineAddr::all() {
            let start = line.index() * WORDS_PER_LINE;
            out[start..start + WORDS_PER_LINE].copy_from_slice(&self.read_line(line));
        }
        out
    }
}
