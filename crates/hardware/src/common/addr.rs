//! Word and Line Address types.
//!
//! This module defines strong types for the two granularities at which the memory
//! image is addressed. It provides the following:
//! 1. **Type Safety:** Distinguishes a word-aligned data address from a coherence line address.
//! 2. **Validation:** Range and alignment checks for instruction-issued addresses.
//! 3. **Line Geometry:** Helpers mapping a word address onto its line and word slot.

use std::fmt;

use serde::Serialize;

use super::constants::{LINE_BYTES, LINE_MASK, MEM_BYTES, NUM_LINES, WORD_BYTES};

/// Reason an instruction-issued address cannot be used for a word access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddrFault {
    /// The word does not lie entirely inside the memory image.
    OutOfRange,
    /// The address is not a multiple of the word size.
    Misaligned,
}

/// A validated, word-aligned byte address inside the memory image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WordAddr(u32);

/// The base address of a 64-byte coherence line.
///
/// Always a multiple of [`LINE_BYTES`] and below [`MEM_BYTES`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LineAddr(u32);

impl WordAddr {
    /// Validates a raw effective address for a 32-bit access.
    ///
    /// Range is checked before alignment, so an address past the end of memory
    /// reports [`AddrFault::OutOfRange`] even when it is also misaligned.
    ///
    /// # Arguments
    ///
    /// * `raw` - The effective address computed by the instruction.
    ///
    /// # Returns
    ///
    /// The validated address, or the reason it cannot be accessed.
    pub fn new(raw: u32) -> Result<Self, AddrFault> {
        let end = u64::from(raw) + WORD_BYTES as u64;
        if end > MEM_BYTES as u64 {
            return Err(AddrFault::OutOfRange);
        }
        if raw as usize % WORD_BYTES != 0 {
            return Err(AddrFault::Misaligned);
        }
        Ok(Self(raw))
    }

    /// Returns the raw byte address.
    #[inline]
    pub const fn val(self) -> u32 {
        self.0
    }

    /// Returns the coherence line containing this word.
    #[inline]
    pub const fn line(self) -> LineAddr {
        LineAddr(self.0 & LINE_MASK)
    }

    /// Returns the index of this word within its line (0-15).
    #[inline]
    pub const fn word_in_line(self) -> usize {
        (self.0 as usize % LINE_BYTES) / WORD_BYTES
    }
}

impl LineAddr {
    /// Returns the line with the given index (0 for bytes 0-63, 1 for 64-127, ...).
    ///
    /// # Arguments
    ///
    /// * `index` - Line index, must be below [`NUM_LINES`].
    ///
    /// # Returns
    ///
    /// `None` if the index does not name a line of the memory image.
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < NUM_LINES {
            Some(Self((index * LINE_BYTES) as u32))
        } else {
            None
        }
    }

    /// Iterates over every line of the memory image in address order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..NUM_LINES).map(|i| Self((i * LINE_BYTES) as u32))
    }

    /// Returns the base byte address of the line.
    #[inline]
    pub const fn val(self) -> u32 {
        self.0
    }

    /// Returns the line index (address divided by the line size).
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize / LINE_BYTES
    }
}

impl fmt::Display for LineAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#05x}", self.0)
    }
}

impl fmt::Display for WordAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#05x}", self.0)
    }
}
