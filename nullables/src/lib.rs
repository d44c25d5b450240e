//! Nullable infrastructure for deterministic testing.
//!
//! External dependencies the ledger reads from (for now only the clock) sit
//! behind traits. This crate provides test-friendly implementations that
//! return deterministic values and can be controlled programmatically.
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;

pub use clock::NullTicker;
