//! Agent implementation.
//!
//! This module contains the per-agent machinery: the agent context (registers,
//! private cache, run state), the instruction executor, and the execution units
//! the agent drives.

/// Agent context (register file, cache, halted flag).
pub mod agent;

/// Fetch, execute and retire of one instruction.
pub mod execute;

/// Execution units (the coherent cache and its replacement policies).
pub mod units;

pub use self::agent::Agent;
