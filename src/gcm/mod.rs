//! AES-GCM authenticated encryption
//!
//! One [`Aead`] capability, two strategies picked once at construction:
//!
//! - **Native**: 12-byte nonce, 16-byte tag. Every seal/open runs on a fresh
//!   provider GCM context that is released before the call returns, and the
//!   tag is checked by the provider at finalize.
//! - **Generic**: exactly one of nonce or tag size is non-standard. The
//!   provider's GCM fixes both sizes, so this path uses the provider only as
//!   a raw block cipher and builds counter mode plus GHASH around it.
//!
//! Asking for a non-standard nonce *and* a non-standard tag together is
//! rejected with [`CipherError::UnsupportedSize`].
//!
//! ## Failure guarantees
//!
//! A failed open zeroes every output byte before returning
//! [`CipherError::Authentication`]. Plaintext is never observable on failure.
//! Wrong nonce length and oversized plaintext are fatal errors
//! (see [`CipherError::is_fatal`]).

pub mod generic;
pub mod native;
pub mod tls;

pub use generic::GenericGcm;
pub use native::NativeGcm;
pub use tls::TlsGcm;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::buffer::InOutBuf;
use crate::cipher::KeyMaterial;
use crate::error::CipherError;
use crate::provider::{AwsLc, CipherProvider};

/// Nonce size of the native path.
pub const STANDARD_NONCE_SIZE: usize = 12;
/// Tag size of the native path.
pub const STANDARD_TAG_SIZE: usize = 16;
/// Smallest tag the generic composition will produce.
pub const MIN_TAG_SIZE: usize = 12;
/// Largest plaintext a single GCM invocation may cover: (2^32 - 2) blocks.
pub const MAX_PLAINTEXT_LEN: u64 = ((1 << 32) - 2) * 16;

/// AEAD shape. `Default` is the standard (12, 16).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GcmParams {
    pub nonce_size: usize,
    pub tag_size: usize,
}

impl Default for GcmParams {
    fn default() -> Self {
        Self {
            nonce_size: STANDARD_NONCE_SIZE,
            tag_size: STANDARD_TAG_SIZE,
        }
    }
}

impl GcmParams {
    pub fn is_standard(&self) -> bool {
        self.nonce_size == STANDARD_NONCE_SIZE && self.tag_size == STANDARD_TAG_SIZE
    }
}

/// Authenticated encryption with associated data.
///
/// `seal_inout`/`open_inout` are the primitive operations over a checked
/// source/destination pair and return the number of output bytes. The
/// provided methods layer `Vec` append and in-place forms on top.
pub trait Aead {
    fn nonce_size(&self) -> usize;

    /// Bytes added by sealing (the tag size).
    fn overhead(&self) -> usize;

    /// Seal `buf.src` into `buf.dst`, which must hold `src_len + overhead`
    /// bytes. On any failure after the buffer checks the output region is
    /// zeroed.
    fn seal_inout(&self, nonce: &[u8], buf: InOutBuf<'_>, aad: &[u8])
    -> Result<usize, CipherError>;

    /// Open `buf.src` (ciphertext followed by tag) into `buf.dst`, which must
    /// hold `src_len - overhead` bytes.
    fn open_inout(&self, nonce: &[u8], buf: InOutBuf<'_>, aad: &[u8])
    -> Result<usize, CipherError>;

    /// Append `ciphertext || tag` to `dst`.
    ///
    /// On failure `dst` keeps its original length.
    fn seal(
        &self,
        dst: &mut Vec<u8>,
        nonce: &[u8],
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<(), CipherError> {
        let start = dst.len();
        check_nonce(nonce, self.nonce_size())?;
        let out_len = sealed_len(plaintext.len(), self.overhead())?;
        let total = start.checked_add(out_len).ok_or(CipherError::MessageTooLarge)?;
        // Grow first so the checks see the final output region.
        dst.resize(total, 0);
        match self.seal_inout(nonce, InOutBuf::new(&mut dst[start..], plaintext), aad) {
            Ok(_) => Ok(()),
            Err(err) => {
                dst.truncate(start);
                Err(err)
            }
        }
    }

    /// Append the plaintext of `ciphertext` to `dst`.
    ///
    /// On failure the appended region is zeroed and `dst` keeps its original
    /// length.
    fn open(
        &self,
        dst: &mut Vec<u8>,
        nonce: &[u8],
        ciphertext: &[u8],
        aad: &[u8],
    ) -> Result<(), CipherError> {
        let start = dst.len();
        check_nonce(nonce, self.nonce_size())?;
        let out_len = opened_len(ciphertext.len(), self.overhead())?;
        dst.resize(start + out_len, 0);
        match self.open_inout(nonce, InOutBuf::new(&mut dst[start..], ciphertext), aad) {
            Ok(written) => {
                dst.truncate(start + written);
                Ok(())
            }
            Err(err) => {
                dst.truncate(start);
                Err(err)
            }
        }
    }

    /// Replace the plaintext in `buf` with `ciphertext || tag`.
    ///
    /// On failure `buf` keeps its original length; its bytes are the
    /// untouched plaintext if the call was rejected up front, zeros otherwise.
    fn seal_in_place(&self, nonce: &[u8], buf: &mut Vec<u8>, aad: &[u8]) -> Result<(), CipherError> {
        let pt_len = buf.len();
        check_nonce(nonce, self.nonce_size())?;
        let out_len = sealed_len(pt_len, self.overhead())?;
        buf.resize(out_len, 0);
        let result = InOutBuf::in_place(buf, pt_len).and_then(|io| self.seal_inout(nonce, io, aad));
        if result.is_err() {
            buf.truncate(pt_len);
        }
        result.map(|_| ())
    }

    /// Replace `ciphertext || tag` in `buf` with the plaintext.
    ///
    /// An authentication failure leaves the whole of `buf` zeroed.
    fn open_in_place(&self, nonce: &[u8], buf: &mut Vec<u8>, aad: &[u8]) -> Result<(), CipherError> {
        let len = buf.len();
        match InOutBuf::in_place(buf, len).and_then(|io| self.open_inout(nonce, io, aad)) {
            Ok(written) => {
                buf.truncate(written);
                Ok(())
            }
            Err(err) => {
                if err == CipherError::Authentication {
                    buf.fill(0);
                }
                Err(err)
            }
        }
    }
}

/// GCM under one key, with the strategy fixed at construction.
///
/// `seal` and `open` take `&self` and never share provider state between
/// calls, so a `Gcm` can be used from several threads at once.
pub enum Gcm<P: CipherProvider = AwsLc> {
    Native(NativeGcm<P>),
    Generic(GenericGcm<P>),
}

impl<P: CipherProvider> Gcm<P> {
    pub(crate) fn new(key: Arc<KeyMaterial<P>>, params: GcmParams) -> Result<Self, CipherError> {
        let standard_nonce = params.nonce_size == STANDARD_NONCE_SIZE;
        let standard_tag = params.tag_size == STANDARD_TAG_SIZE;
        match (standard_nonce, standard_tag) {
            (true, true) => {
                debug!(strategy = "native", "GCM strategy selected");
                Ok(Gcm::Native(NativeGcm::new(key)))
            }
            (false, false) => Err(CipherError::UnsupportedSize {
                nonce_size: params.nonce_size,
                tag_size: params.tag_size,
            }),
            _ => {
                let generic = GenericGcm::new(key, params.nonce_size, params.tag_size)?;
                debug!(
                    strategy = "generic",
                    nonce_size = params.nonce_size,
                    tag_size = params.tag_size,
                    "GCM strategy selected"
                );
                Ok(Gcm::Generic(generic))
            }
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Gcm::Native(_))
    }

    pub fn params(&self) -> GcmParams {
        GcmParams {
            nonce_size: self.nonce_size(),
            tag_size: self.overhead(),
        }
    }
}

impl<P: CipherProvider> fmt::Debug for Gcm<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gcm::Native(g) => f.debug_tuple("Native").field(g).finish(),
            Gcm::Generic(g) => f.debug_tuple("Generic").field(g).finish(),
        }
    }
}

impl<P: CipherProvider> Aead for Gcm<P> {
    fn nonce_size(&self) -> usize {
        match self {
            Gcm::Native(g) => g.nonce_size(),
            Gcm::Generic(g) => g.nonce_size(),
        }
    }

    fn overhead(&self) -> usize {
        match self {
            Gcm::Native(g) => g.overhead(),
            Gcm::Generic(g) => g.overhead(),
        }
    }

    fn seal_inout(
        &self,
        nonce: &[u8],
        buf: InOutBuf<'_>,
        aad: &[u8],
    ) -> Result<usize, CipherError> {
        match self {
            Gcm::Native(g) => g.seal_inout(nonce, buf, aad),
            Gcm::Generic(g) => g.seal_inout(nonce, buf, aad),
        }
    }

    fn open_inout(
        &self,
        nonce: &[u8],
        buf: InOutBuf<'_>,
        aad: &[u8],
    ) -> Result<usize, CipherError> {
        match self {
            Gcm::Native(g) => g.open_inout(nonce, buf, aad),
            Gcm::Generic(g) => g.open_inout(nonce, buf, aad),
        }
    }
}

pub(crate) fn check_nonce(nonce: &[u8], expected: usize) -> Result<(), CipherError> {
    if nonce.len() != expected {
        return Err(CipherError::NonceLength {
            expected,
            actual: nonce.len(),
        });
    }
    Ok(())
}

/// Output length of sealing `pt_len` bytes.
pub(crate) fn sealed_len(pt_len: usize, tag_size: usize) -> Result<usize, CipherError> {
    if pt_len as u64 > MAX_PLAINTEXT_LEN {
        return Err(CipherError::MessageTooLarge);
    }
    pt_len
        .checked_add(tag_size)
        .ok_or(CipherError::MessageTooLarge)
}

/// Plaintext length of opening `ct_len` bytes. Malformed lengths are an
/// authentication failure, not a contract breach.
pub(crate) fn opened_len(ct_len: usize, tag_size: usize) -> Result<usize, CipherError> {
    let Some(body) = ct_len.checked_sub(tag_size) else {
        return Err(CipherError::Authentication);
    };
    if body as u64 > MAX_PLAINTEXT_LEN {
        return Err(CipherError::Authentication);
    }
    Ok(body)
}
