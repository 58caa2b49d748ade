//! Tests for shared building blocks.
