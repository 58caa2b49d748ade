//! Shared-memory Components.
//!
//! This module organizes what the agents share: the memory image and the
//! coherence bus that owns it and arbitrates every access to it.

/// Snooping coherence bus.
pub mod interconnect;

/// Memory backing store.
pub mod memory;

pub use interconnect::CoherenceBus;
pub use memory::MemoryImage;
