//! FFI error codes.

use crate::error::CipherError;

/// C-compatible error codes for FFI boundary
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FipsCipherError {
    /// Operation succeeded
    Ok = 0,
    /// Null pointer provided for a non-empty region
    NullPointer = 1,
    /// Invalid or already-freed handle
    InvalidHandle = 2,
    /// Key is not 16, 24 or 32 bytes
    InvalidKeySize = 3,
    /// Input is not a whole number of blocks
    BlockAlignment = 4,
    /// Output buffer too small
    BufferTooSmall = 5,
    /// Input and output partially overlap
    Overlap = 6,
    /// IV is not 16 bytes
    InvalidIvLength = 7,
    /// Nonce length does not match the AEAD
    InvalidNonceLength = 8,
    /// Plaintext exceeds the GCM limit
    MessageTooLarge = 9,
    /// Nonce and tag sizes cannot be combined
    UnsupportedSize = 10,
    /// Tag mismatch or malformed ciphertext; output was zeroed
    AuthenticationFailed = 11,
    /// TLS nonce counter did not increase
    NonceOrder = 12,
    /// Object already closed
    Closed = 13,
    /// Provider call failed
    ProviderFailure = 14,
    /// Internal panic caught at the boundary
    Internal = 15,
}

impl From<CipherError> for FipsCipherError {
    fn from(e: CipherError) -> Self {
        match e {
            CipherError::KeySize(_) => FipsCipherError::InvalidKeySize,
            CipherError::BlockAlignment(_) => FipsCipherError::BlockAlignment,
            CipherError::Length { .. } => FipsCipherError::BufferTooSmall,
            CipherError::Overlap => FipsCipherError::Overlap,
            CipherError::IvLength { .. } => FipsCipherError::InvalidIvLength,
            CipherError::NonceLength { .. } => FipsCipherError::InvalidNonceLength,
            CipherError::MessageTooLarge => FipsCipherError::MessageTooLarge,
            CipherError::UnsupportedSize { .. } => FipsCipherError::UnsupportedSize,
            CipherError::Authentication => FipsCipherError::AuthenticationFailed,
            CipherError::NonceOrder => FipsCipherError::NonceOrder,
            CipherError::Closed => FipsCipherError::Closed,
            CipherError::Provider(_) => FipsCipherError::ProviderFailure,
        }
    }
}

impl<T> From<Result<T, CipherError>> for FipsCipherError {
    fn from(result: Result<T, CipherError>) -> Self {
        match result {
            Ok(_) => FipsCipherError::Ok,
            Err(e) => e.into(),
        }
    }
}
