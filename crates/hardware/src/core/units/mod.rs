//! Execution units and functional components.
//!
//! Each agent drives a single unit: its private MOESI cache, together with the
//! line state machine and the replacement policies it is built from.

/// Per-agent coherent cache with the MOESI state machine and replacement policies.
pub mod cache;
