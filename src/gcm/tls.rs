//! GCM for TLS 1.2 records.
//!
//! TLS 1.2 builds the GCM nonce from a 4-byte fixed salt and an 8-byte
//! explicit part that the sender must never repeat. Sealing checks that the
//! explicit part, read as a big-endian counter, strictly increases.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{Aead, NativeGcm, STANDARD_NONCE_SIZE, check_nonce};
use crate::buffer::InOutBuf;
use crate::cipher::KeyMaterial;
use crate::error::CipherError;
use crate::provider::{AwsLc, CipherProvider};

const EXPLICIT_NONCE_OFFSET: usize = 4;

/// Standard GCM with sender-side nonce ordering.
pub struct TlsGcm<P: CipherProvider = AwsLc> {
    inner: NativeGcm<P>,
    /// Smallest counter the next seal may use.
    next: AtomicU64,
}

impl<P: CipherProvider> TlsGcm<P> {
    pub(crate) fn new(key: Arc<KeyMaterial<P>>) -> Result<Self, CipherError> {
        Ok(Self {
            inner: NativeGcm::new(key),
            next: AtomicU64::new(0),
        })
    }

    /// Reserve `counter` or fail with [`CipherError::NonceOrder`].
    fn claim(&self, counter: u64) -> Result<(), CipherError> {
        if counter == u64::MAX {
            return Err(CipherError::NonceOrder);
        }
        let mut current = self.next.load(Ordering::Acquire);
        loop {
            if counter < current {
                return Err(CipherError::NonceOrder);
            }
            match self.next.compare_exchange_weak(
                current,
                counter + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(()),
                Err(actual) => current = actual,
            }
        }
    }
}

impl<P: CipherProvider> Aead for TlsGcm<P> {
    fn nonce_size(&self) -> usize {
        STANDARD_NONCE_SIZE
    }

    fn overhead(&self) -> usize {
        self.inner.overhead()
    }

    fn seal_inout(
        &self,
        nonce: &[u8],
        buf: InOutBuf<'_>,
        aad: &[u8],
    ) -> Result<usize, CipherError> {
        check_nonce(nonce, STANDARD_NONCE_SIZE)?;
        let mut explicit = [0u8; 8];
        explicit.copy_from_slice(&nonce[EXPLICIT_NONCE_OFFSET..]);
        self.claim(u64::from_be_bytes(explicit))?;
        self.inner.seal_inout(nonce, buf, aad)
    }

    fn open_inout(
        &self,
        nonce: &[u8],
        buf: InOutBuf<'_>,
        aad: &[u8],
    ) -> Result<usize, CipherError> {
        self.inner.open_inout(nonce, buf, aad)
    }
}

impl<P: CipherProvider> fmt::Debug for TlsGcm<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsGcm")
            .field("inner", &self.inner)
            .field("next", &self.next.load(Ordering::Relaxed))
            .finish()
    }
}
