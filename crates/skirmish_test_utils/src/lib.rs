//! # Skirmish Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Replay checks for match determinism
//! - Map and match fixtures, including RON scenarios
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
