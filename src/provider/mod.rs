//! Binding to the certified cryptography provider.
//!
//! The engine never performs AES arithmetic itself. Everything goes through a
//! [`CipherProvider`], which exposes the classic EVP-style protocol on an
//! opaque context: create, init (algorithm, key, IV, direction), update any
//! number of times, finalize, get/set the AEAD tag, free.
//!
//! [`AwsLc`] is the production provider. With the `fips` feature it links the
//! FIPS-validated AWS-LC module.

mod aws_lc;

pub use aws_lc::{AwsLc, EvpCipherCtx};

use crate::error::{CipherError, ProviderError};

/// AES block size in bytes. Fixed for every key size.
pub const BLOCK_SIZE: usize = 16;

/// AES key length, chosen solely from the key material's length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySize {
    Aes128,
    Aes192,
    Aes256,
}

impl KeySize {
    /// Resolve the key size from a key length in bytes.
    ///
    /// # Errors
    /// [`CipherError::KeySize`] for anything other than 16, 24 or 32 bytes.
    pub fn from_key_len(len: usize) -> Result<Self, CipherError> {
        match len.checked_mul(8) {
            Some(128) => Ok(KeySize::Aes128),
            Some(192) => Ok(KeySize::Aes192),
            Some(256) => Ok(KeySize::Aes256),
            _ => Err(CipherError::KeySize(len)),
        }
    }

    pub fn bits(self) -> usize {
        match self {
            KeySize::Aes128 => 128,
            KeySize::Aes192 => 192,
            KeySize::Aes256 => 256,
        }
    }

    pub fn key_len(self) -> usize {
        self.bits() / 8
    }
}

/// Block cipher mode requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Ecb,
    Cbc,
    Ctr,
    Gcm,
}

impl Mode {
    /// Modes whose provider contexts buffer whole blocks and therefore run
    /// with padding disabled.
    pub fn is_block_mode(self) -> bool {
        matches!(self, Mode::Ecb | Mode::Cbc)
    }
}

/// Provider algorithm selector: one per (key size, mode) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Algorithm {
    pub key_size: KeySize,
    pub mode: Mode,
}

impl Algorithm {
    /// Select the algorithm for a key of `key_len` bytes in `mode`.
    pub fn for_key(key_len: usize, mode: Mode) -> Result<Self, CipherError> {
        Ok(Self {
            key_size: KeySize::from_key_len(key_len)?,
            mode,
        })
    }

    pub fn name(&self) -> &'static str {
        match (self.key_size, self.mode) {
            (KeySize::Aes128, Mode::Ecb) => "AES-128-ECB",
            (KeySize::Aes192, Mode::Ecb) => "AES-192-ECB",
            (KeySize::Aes256, Mode::Ecb) => "AES-256-ECB",
            (KeySize::Aes128, Mode::Cbc) => "AES-128-CBC",
            (KeySize::Aes192, Mode::Cbc) => "AES-192-CBC",
            (KeySize::Aes256, Mode::Cbc) => "AES-256-CBC",
            (KeySize::Aes128, Mode::Ctr) => "AES-128-CTR",
            (KeySize::Aes192, Mode::Ctr) => "AES-192-CTR",
            (KeySize::Aes256, Mode::Ctr) => "AES-256-CTR",
            (KeySize::Aes128, Mode::Gcm) => "AES-128-GCM",
            (KeySize::Aes192, Mode::Gcm) => "AES-192-GCM",
            (KeySize::Aes256, Mode::Gcm) => "AES-256-GCM",
        }
    }
}

/// Cipher direction bound to a context at init time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

/// The trusted provider interface.
///
/// Implementations only translate calls; they do no buffer validation. The
/// engine guarantees the protocol order (init before update, finalize at most
/// once, free exactly once) and that every pointer pair handed to
/// [`update`](CipherProvider::update) is either disjoint or identical.
pub trait CipherProvider: Clone + Send + Sync + 'static {
    /// Opaque provider-side cipher state.
    type RawContext: Send;

    fn create_context(&self) -> Result<Self::RawContext, ProviderError>;

    /// Bind `ctx` to an algorithm, key, optional IV and direction.
    fn init_context(
        &self,
        ctx: &mut Self::RawContext,
        algorithm: Algorithm,
        key: &[u8],
        iv: Option<&[u8]>,
        direction: Direction,
    ) -> Result<(), ProviderError>;

    /// Replace the IV of an initialized context, keeping its key schedule.
    fn reset_iv(&self, ctx: &mut Self::RawContext, iv: &[u8]) -> Result<(), ProviderError>;

    /// Stream `len` bytes from `input` through the context.
    ///
    /// A null `out` feeds associated data to an AEAD context.
    ///
    /// # Safety
    /// `input` must be valid for reads of `len` bytes and `out`, when not
    /// null, valid for writes of `len` bytes. The two regions must be either
    /// disjoint or start at the same address.
    unsafe fn update(
        &self,
        ctx: &mut Self::RawContext,
        out: *mut u8,
        input: *const u8,
        len: usize,
    ) -> Result<usize, ProviderError>;

    /// Finish the operation, returning the bytes written to `out`.
    ///
    /// # Safety
    /// `out` must be valid for writes of one block.
    unsafe fn finalize(&self, ctx: &mut Self::RawContext, out: *mut u8)
    -> Result<usize, ProviderError>;

    fn set_padding(&self, ctx: &mut Self::RawContext, enabled: bool) -> Result<(), ProviderError>;

    /// Read the AEAD tag after a finalized encryption.
    fn get_tag(&self, ctx: &mut Self::RawContext, tag: &mut [u8]) -> Result<(), ProviderError>;

    /// Set the expected AEAD tag before finalizing a decryption.
    fn set_tag(&self, ctx: &mut Self::RawContext, tag: &[u8]) -> Result<(), ProviderError>;

    fn free_context(&self, ctx: Self::RawContext);

    /// Whether the provider runs in its certified FIPS mode.
    fn fips_mode(&self) -> bool;
}
