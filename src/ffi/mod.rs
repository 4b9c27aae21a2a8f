//! C FFI layer for fips-cipher-core
//!
//! Opaque handles for the cipher, CBC, CTR and GCM objects plus
//! `#[repr(C)]` error codes. All functions are panic-safe.

pub mod cipher;
pub mod error;
pub mod handles;

pub use error::FipsCipherError;
pub use handles::*;

// Re-export FFI functions for C clients
pub use cipher::{
    fips_aes_decrypt_block, fips_aes_encrypt_block, fips_aes_free, fips_aes_new, fips_cbc_crypt_blocks,
    fips_cbc_free, fips_cbc_new, fips_cbc_set_iv, fips_cipher_fips_mode, fips_ctr_free, fips_ctr_new,
    fips_ctr_xor_key_stream, fips_gcm_free, fips_gcm_new, fips_gcm_nonce_size, fips_gcm_open,
    fips_gcm_overhead, fips_gcm_seal,
};
