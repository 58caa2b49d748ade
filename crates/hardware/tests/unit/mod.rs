//! # Unit Components
//!
//! Tests for each layer of the simulator, laid out like `src/`.

/// Address types, registers and error classification.
pub mod common;




/// Program loading, the debug controller and end-to-end properties.
pub mod sim;
