//! MOESI cache-coherence simulator library.
//!
//! This crate implements an instruction-level multi-agent simulator whose agents
//! share a small memory through per-agent MOESI caches:
//! 1. **ISA:** A textual instruction format, its decoder and disassembler.
//! 2. **Core:** Agents (register file, private cache) and the instruction executor.
//! 3. **Coherence:** The MOESI line state machine, replacement policies and the snooping bus.
//! 4. **Simulation:** Program loading, stepping, breakpoints and state snapshots.
//! 5. **Observability:** Configuration, statistics and a bounded coherence trace.
//!
//! # Examples
//!
//! ```
//! use moesim_core::Simulator;
//!
//! let mut sim = Simulator::default();
//! assert!(sim.set_code_text("li a0, 42\nsw a0, 8(zero)\nhalt"));
//! assert!(sim.run_to_break());
//! assert_eq!(sim.registers()[10], 42);
//! assert_eq!(sim.memory()[2], 42);
//! ```

/// Common types and constants (addresses, registers, errors).
pub mod common;
/// Simulator configuration (defaults, enums, hierarchical config structures).
pub mod config;
/// Agents, the instruction executor and the coherent cache.
pub mod core;
/// Instruction set (instructions, decoder, ABI register names, disassembler).
pub mod isa;
/// Program loader and the debug controller.
pub mod sim;
/// Memory image and coherence bus.
pub mod soc;
/// Statistics and coherence trace records.
pub mod stats;

/// Root configuration type; use `Config::default()` or `Config::from_json`.
pub use crate::config::Config;
/// Error reported by every failing simulator operation.
pub use crate::common::error::SimError;
/// MOESI state of a cached line.
pub use crate::core::units::cache::moesi::LineState;
/// Top-level simulator; construct with `Simulator::new` or `Simulator::default`.
pub use crate::sim::Simulator;
