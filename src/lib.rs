//! # fips-cipher-core
//!
//! AES block operation, CBC, CTR and GCM over a certified provider (AWS-LC).
//!
//! The crate never does AES arithmetic itself. It owns key copies, checks
//! every buffer before the provider touches it, and frees each native
//! context exactly once.
//!
//! ## Features
//!
//! | Feature | Description | Default |
//! |:--------|:------------|:-------:|
//! | `fips` | Link the FIPS-validated `aws-lc-fips-sys` module | No |
//! | `ffi` | C ABI and header generation | No |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fips_cipher_core::{Aead, AesCipher};
//!
//! let cipher = AesCipher::new(&[0u8; 16]).unwrap();
//! let gcm = cipher.new_gcm().unwrap();
//! let nonce = [0u8; 12];
//!
//! let mut sealed = Vec::new();
//! gcm.seal(&mut sealed, &nonce, b"hello world!", b"").unwrap();
//! assert_eq!(sealed.len(), 12 + 16);
//!
//! let mut opened = Vec::new();
//! gcm.open(&mut opened, &nonce, &sealed, b"").unwrap();
//! assert_eq!(opened, b"hello world!");
//! ```
//!
//! ## Chained Modes
//!
//! ```rust,no_run
//! use fips_cipher_core::AesCipher;
//!
//! let cipher = AesCipher::new(&[7u8; 32]).unwrap();
//! let iv = [1u8; 16];
//!
//! let mut blocks = [0u8; 32];
//! cipher.new_cbc_encrypter(&iv).unwrap().crypt_blocks_in_place(&mut blocks).unwrap();
//! cipher.new_cbc_decrypter(&iv).unwrap().crypt_blocks_in_place(&mut blocks).unwrap();
//! assert_eq!(blocks, [0u8; 32]);
//!
//! let mut stream = *b"any length at all";
//! cipher.new_ctr(&iv).unwrap().apply_keystream(&mut stream).unwrap();
//! ```
//!
//! ## Security Properties
//!
//! - **Certified provider**: every AES operation runs inside AWS-LC
//! - **Buffer safety**: short or partially overlapping buffers are rejected
//!   before any native call
//! - **No plaintext on failure**: a failed GCM open zeroes its output
//! - **One-shot GCM contexts**: each seal/open gets a fresh native context
//! - **Memory safety**: `zeroize` on drop for all key material

// Provider binding
pub mod provider;
pub use provider::{Algorithm, AwsLc, BLOCK_SIZE, CipherProvider, Direction, KeySize, Mode};

// Buffer checks
pub mod buffer;
pub use buffer::{InOutBuf, check_min_length, check_no_overlap};

mod context;

pub mod error;
pub use error::{CipherError, ProviderError};

// Native context accounting
pub mod metrics;
pub use metrics::{ContextStats, ContextStatsSnapshot};

// Cipher handle and modes
pub mod cipher;
pub use cipher::{AesCipher, BlockContext};

pub mod modes;
pub use modes::{Cbc, Ctr};

pub mod gcm;
pub use gcm::{Aead, Gcm, GcmParams, TlsGcm};

// C FFI layer (feature-gated)
#[cfg(feature = "ffi")]
pub mod ffi;
#[cfg(feature = "ffi")]
pub use ffi::FipsCipherError;

#[cfg(test)]
mod testing;

/// Whether the linked provider is running in FIPS mode.
pub fn fips_mode() -> bool {
    AwsLc::new().fips_mode()
}
