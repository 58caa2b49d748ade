//! Simulation control and program loading.
//!
//! Provides the program loader and the [`Simulator`], the debug controller that
//! owns a whole session.

/// Program text decoding into a [`loader::Program`].
pub mod loader;

/// The debug controller.
pub mod simulator;

pub use loader::Program;
pub use simulator::{CacheStateTable, Simulator};
