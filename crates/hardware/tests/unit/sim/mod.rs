//! Tests for program loading, the debug controller and whole-machine properties.

/// Two-pass program loading and error selection.
pub mod loader;


/// Stepping, breakpoints, snapshots, reset and error reporting.
pub mod simulator;
