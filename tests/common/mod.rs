//! Common test utilities and fixtures for the fips-cipher-core test suite.
//!
//! Shared known-answer vectors and helpers used across the block-mode, GCM,
//! property and concurrency tests.

#![allow(dead_code)]

pub mod fixtures;

use tracing_subscriber::EnvFilter;

/// Route the crate's `tracing` events to the test writer. Filter with
/// `RUST_LOG`, e.g. `RUST_LOG=fips_cipher_core=trace`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
