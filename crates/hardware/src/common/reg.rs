//! Agent Register File.
//!
//! This module provides the `RegisterFile` struct, the architectural state owned by
//! a single agent. It provides:
//! 1. **Storage:** 32 general-purpose 32-bit registers and a program counter.
//! 2. **Invariant Enforcement:** Register `x0` is hardwired to zero.
//! 3. **Observability:** Snapshot and dump utilities for debugging.

use crate::common::constants::NUM_REGS;

/// General-purpose registers plus the program counter of one agent.
///
/// The program counter is a line index into the loaded program, not a byte address.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterFile {
    regs: [u32; NUM_REGS],
    /// Index of the next instruction to execute.
    pub pc: usize,
}

impl RegisterFile {
    /// Creates a register file with every register and the program counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a general-purpose register.
    ///
    /// # Arguments
    ///
    /// * `idx` - Register index (0-31). Register `x0` always returns 0.
    ///
    /// # Returns
    ///
    /// The 32-bit value stored in the specified register.
    #[inline]
    pub fn read(&self, idx: usize) -> u32 {
        if idx == 0 { 0 } else { self.regs[idx] }
    }

    /// Writes a general-purpose register.
    ///
    /// # Arguments
    ///
    /// * `idx` - Register index (0-31). Writes to `x0` are ignored.
    /// * `val` - The 32-bit value to write.
    #[inline]
    pub fn write(&mut self, idx: usize, val: u32) {
        if idx != 0 {
            self.regs[idx] = val;
        }
    }

    /// Returns a copy of all 32 registers, index `i` holding `xi`.
    pub fn snapshot(&self) -> [u32; NUM_REGS] {
        self.regs
    }

    /// Formats all registers in pairs, one pair per line, for debug dumps.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for i in (0..NUM_REGS).step_by(2) {
            out.push_str(&format!(
                "x{:<2}={:#010x} x{:<2}={:#010x}\n",
                i,
                self.regs[i],
                i + 1,
                self.regs[i + 1]
            ));
        }
        out
    }
}
