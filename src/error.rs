//! Error types for the cipher engine.
//!
//! Two groups share one enum. Contract violations (short buffers, partial
//! overlap, wrong IV or nonce length, oversized GCM messages, use after close)
//! report [`CipherError::is_fatal`] and should abort the caller's operation
//! outright. Cryptographic outcomes (key size, block alignment, AEAD shape,
//! authentication) are ordinary recoverable results.

use thiserror::Error;

/// Failure reported by the native provider for one operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation} failed: {diagnostic}")]
pub struct ProviderError {
    /// Provider call that failed, e.g. `EVP_CipherInit_ex`.
    pub operation: &'static str,
    /// Diagnostic text drained from the provider's error queue.
    pub diagnostic: String,
}

impl ProviderError {
    pub fn new(operation: &'static str, diagnostic: impl Into<String>) -> Self {
        Self {
            operation,
            diagnostic: diagnostic.into(),
        }
    }
}

/// Errors that can occur during cipher operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("invalid AES key size {0}")]
    KeySize(usize),

    #[error("input not full blocks: {0} bytes is not a multiple of 16")]
    BlockAlignment(usize),

    #[error("buffer too short: need {needed} bytes, got {actual}")]
    Length { needed: usize, actual: usize },

    #[error("invalid buffer overlap")]
    Overlap,

    #[error("incorrect IV length {actual}, expected {expected}")]
    IvLength { expected: usize, actual: usize },

    #[error("incorrect nonce length {actual} given to GCM, expected {expected}")]
    NonceLength { expected: usize, actual: usize },

    #[error("message too large for GCM")]
    MessageTooLarge,

    #[error("unsupported GCM shape: nonce size {nonce_size}, tag size {tag_size}")]
    UnsupportedSize { nonce_size: usize, tag_size: usize },

    #[error("message authentication failed")]
    Authentication,

    #[error("nonce counter must be strictly increasing and below 2^64-1")]
    NonceOrder,

    #[error("cipher context already closed")]
    Closed,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl CipherError {
    /// True for caller contract breaches that must not be retried.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CipherError::Length { .. }
                | CipherError::Overlap
                | CipherError::IvLength { .. }
                | CipherError::NonceLength { .. }
                | CipherError::MessageTooLarge
                | CipherError::NonceOrder
                | CipherError::Closed
        )
    }
}
