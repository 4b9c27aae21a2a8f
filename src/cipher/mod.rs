//! AES cipher handle
//!
//! [`AesCipher`] owns a private copy of the key and hands out mode objects.
//! Its own block contexts are created on first use. CBC and CTR objects
//! create theirs at construction; GCM creates one per seal or open.
//!
//! # Threading
//!
//! Objects with mutable native state take `&mut self` and are `Send` but not
//! meant to be shared. Two objects derived from the same handle own
//! independent contexts and may run on different threads; the key copy is
//! read-only and shared through an `Arc`.

pub mod block;

pub use block::BlockContext;

use std::fmt;
use std::sync::Arc;
use zeroize::Zeroizing;

use crate::buffer::InOutBuf;
use crate::error::CipherError;
use crate::gcm::{Gcm, GcmParams, TlsGcm};
use crate::metrics::{ContextStats, ContextStatsSnapshot};
use crate::modes::{Cbc, Ctr};
use crate::provider::{AwsLc, BLOCK_SIZE, CipherProvider, Direction, KeySize};

/// Key copy plus everything a derived object needs to reach the provider.
pub(crate) struct KeyMaterial<P: CipherProvider> {
    key: Zeroizing<Vec<u8>>,
    key_size: KeySize,
    provider: P,
    stats: Arc<ContextStats>,
}

impl<P: CipherProvider> KeyMaterial<P> {
    pub(crate) fn bytes(&self) -> &[u8] {
        &self.key
    }

    pub(crate) fn key_size(&self) -> KeySize {
        self.key_size
    }

    pub(crate) fn provider(&self) -> &P {
        &self.provider
    }

    pub(crate) fn stats(&self) -> &Arc<ContextStats> {
        &self.stats
    }
}

/// AES under a certified provider.
pub struct AesCipher<P: CipherProvider = AwsLc> {
    key: Arc<KeyMaterial<P>>,
    enc: BlockContext<P>,
    dec: BlockContext<P>,
}

impl AesCipher<AwsLc> {
    /// Copy `key` and bind it to the AWS-LC provider.
    ///
    /// # Errors
    /// [`CipherError::KeySize`] unless `key` is 16, 24 or 32 bytes.
    pub fn new(key: &[u8]) -> Result<Self, CipherError> {
        Self::with_provider(key, AwsLc::new())
    }
}

impl<P: CipherProvider> AesCipher<P> {
    pub fn with_provider(key: &[u8], provider: P) -> Result<Self, CipherError> {
        let key_size = KeySize::from_key_len(key.len())?;
        let key = Arc::new(KeyMaterial {
            key: Zeroizing::new(key.to_vec()),
            key_size,
            provider,
            stats: Arc::new(ContextStats::new()),
        });
        Ok(Self {
            enc: BlockContext::new(Arc::clone(&key), Direction::Encrypt),
            dec: BlockContext::new(Arc::clone(&key), Direction::Decrypt),
            key,
        })
    }

    pub fn key_size(&self) -> KeySize {
        self.key.key_size
    }

    pub fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    /// Encrypt the first block of `src` into the first block of `dst`.
    pub fn encrypt_block(&mut self, dst: &mut [u8], src: &[u8]) -> Result<(), CipherError> {
        self.enc.crypt_block(dst, src)
    }

    /// Decrypt the first block of `src` into the first block of `dst`.
    pub fn decrypt_block(&mut self, dst: &mut [u8], src: &[u8]) -> Result<(), CipherError> {
        self.dec.crypt_block(dst, src)
    }

    pub fn encrypt_block_in_place(&mut self, block: &mut [u8]) -> Result<(), CipherError> {
        self.enc.crypt_block_in_place(block)
    }

    pub fn decrypt_block_in_place(&mut self, block: &mut [u8]) -> Result<(), CipherError> {
        self.dec.crypt_block_in_place(block)
    }

    pub fn encrypt_block_inout(&mut self, buf: InOutBuf<'_>) -> Result<(), CipherError> {
        self.enc.crypt_block_inout(buf)
    }

    pub fn decrypt_block_inout(&mut self, buf: InOutBuf<'_>) -> Result<(), CipherError> {
        self.dec.crypt_block_inout(buf)
    }

    /// A standalone encrypting block context with its own native context.
    pub fn new_encryptor(&self) -> BlockContext<P> {
        BlockContext::new(Arc::clone(&self.key), Direction::Encrypt)
    }

    /// A standalone decrypting block context with its own native context.
    pub fn new_decryptor(&self) -> BlockContext<P> {
        BlockContext::new(Arc::clone(&self.key), Direction::Decrypt)
    }

    pub fn new_cbc_encrypter(&self, iv: &[u8]) -> Result<Cbc<P>, CipherError> {
        Cbc::new(Arc::clone(&self.key), iv, Direction::Encrypt)
    }

    pub fn new_cbc_decrypter(&self, iv: &[u8]) -> Result<Cbc<P>, CipherError> {
        Cbc::new(Arc::clone(&self.key), iv, Direction::Decrypt)
    }

    pub fn new_ctr(&self, iv: &[u8]) -> Result<Ctr<P>, CipherError> {
        Ctr::new(Arc::clone(&self.key), iv)
    }

    /// Standard GCM: 12-byte nonce, 16-byte tag, native provider path.
    pub fn new_gcm(&self) -> Result<Gcm<P>, CipherError> {
        Gcm::new(Arc::clone(&self.key), GcmParams::default())
    }

    /// GCM with caller-chosen sizes.
    ///
    /// Standard sizes use the native path. Exactly one non-standard size
    /// selects the generic composition over this cipher's raw block
    /// operation. Both non-standard at once fails with
    /// [`CipherError::UnsupportedSize`].
    pub fn new_gcm_with_sizes(
        &self,
        nonce_size: usize,
        tag_size: usize,
    ) -> Result<Gcm<P>, CipherError> {
        Gcm::new(
            Arc::clone(&self.key),
            GcmParams {
                nonce_size,
                tag_size,
            },
        )
    }

    pub fn new_gcm_with_params(&self, params: &GcmParams) -> Result<Gcm<P>, CipherError> {
        Gcm::new(Arc::clone(&self.key), *params)
    }

    /// Standard GCM whose seal enforces strictly increasing TLS record
    /// nonces.
    pub fn new_gcm_tls(&self) -> Result<TlsGcm<P>, CipherError> {
        TlsGcm::new(Arc::clone(&self.key))
    }

    /// Native context counters for this handle and everything derived from it.
    pub fn context_stats(&self) -> ContextStatsSnapshot {
        self.key.stats.snapshot()
    }

    pub fn fips_mode(&self) -> bool {
        self.key.provider.fips_mode()
    }

    #[cfg(test)]
    pub(crate) fn key_material(&self) -> &Arc<KeyMaterial<P>> {
        &self.key
    }

    /// Release this handle's own block contexts. Derived objects are
    /// unaffected.
    pub fn close(&mut self) {
        self.enc.close();
        self.dec.close();
    }
}

impl<P: CipherProvider> fmt::Debug for AesCipher<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AesCipher")
            .field("key_size", &self.key.key_size)
            .field("enc_ready", &self.enc.is_ready())
            .field("dec_ready", &self.dec.is_ready())
            .finish_non_exhaustive()
    }
}
