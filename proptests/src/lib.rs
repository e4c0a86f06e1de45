//! Property-based tests for the file-proof client.
//!
//! This crate contains proptest-based property tests for verifying
//! invariants across the commitment, authorization and challenge components.
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all property tests
//! cargo test -p proptests
//!
//! # Run with more test cases (slower but more thorough)
//! PROPTEST_CASES=10000 cargo test -p proptests
//!
//! # Run specific test module
//! cargo test -p proptests packer
//! ```
//!
//! ## Test Categories
//!
//! - **Codec tests**: G1/G2 limb and appended layouts (round-trip, zero high bytes)
//! - **Packer tests**: element counts, window bijection, field round-trip
//! - **Commitment tests**: opening verification, aggregation linearity
//! - **Authorization tests**: credential recovery, 5-of-5 signer rules
//! - **Tracker tests**: deadlines, phase parity, next-action consistency

// Re-export common for use in test modules
pub use common;

/// Shared test strategies and helpers.
pub mod strategies;

// Test modules
#[cfg(test)]
mod authorization;
#[cfg(test)]
mod codec;
#[cfg(test)]
mod commitment;
#[cfg(test)]
mod packer;
#[cfg(test)]
mod tracker;
