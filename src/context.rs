//! Scoped ownership of one provider cipher context.
//!
//! A [`NativeContext`] is created and initialized in one step and frees its
//! provider context exactly once, from `Drop` or an explicit [`release`]
//! (whichever comes first). A context whose init fails is freed too.
//!
//! [`release`]: NativeContext::release

use std::sync::Arc;
use tracing::trace;

use crate::buffer::InOutBuf;
use crate::error::{CipherError, ProviderError};
use crate::metrics::ContextStats;
use crate::provider::{Algorithm, CipherProvider, Direction};

pub(crate) struct NativeContext<P: CipherProvider> {
    provider: P,
    raw: Option<P::RawContext>,
    algorithm: Algorithm,
    stats: Arc<ContextStats>,
}

impl<P: CipherProvider> NativeContext<P> {
    /// Create a context and bind it to `algorithm`, `key`, `iv` and
    /// `direction`. Block modes run with provider padding disabled.
    pub(crate) fn new(
        provider: &P,
        algorithm: Algorithm,
        key: &[u8],
        iv: Option<&[u8]>,
        direction: Direction,
        stats: &Arc<ContextStats>,
    ) -> Result<Self, CipherError> {
        let raw = provider.create_context()?;
        stats.record_created();
        trace!(algorithm = algorithm.name(), ?direction, "native context created");

        let mut ctx = Self {
            provider: provider.clone(),
            raw: Some(raw),
            algorithm,
            stats: Arc::clone(stats),
        };
        // From here on a failure drops `ctx`, which frees the provider context.
        let raw = ctx.raw.as_mut().ok_or(CipherError::Closed)?;
        provider.init_context(raw, algorithm, key, iv, direction)?;
        if algorithm.mode.is_block_mode() {
            provider.set_padding(raw, false)?;
        }
        Ok(ctx)
    }

    pub(crate) fn reset_iv(&mut self, iv: &[u8]) -> Result<(), CipherError> {
        let raw = self.raw.as_mut().ok_or(CipherError::Closed)?;
        self.provider.reset_iv(raw, iv)?;
        Ok(())
    }

    /// Feed associated data to an AEAD context.
    pub(crate) fn update_aad(&mut self, aad: &[u8]) -> Result<(), CipherError> {
        if aad.is_empty() {
            return Ok(());
        }
        let raw = self.raw.as_mut().ok_or(CipherError::Closed)?;
        // SAFETY: aad is a live slice; a null output selects AAD input.
        unsafe {
            self.provider
                .update(raw, std::ptr::null_mut(), aad.as_ptr(), aad.len())?;
        }
        Ok(())
    }

    /// Stream the first `len` source bytes of `buf` into its destination.
    ///
    /// The caller must already have run `buf.check(..)` for at least `len`
    /// destination bytes.
    pub(crate) fn update(&mut self, buf: &mut InOutBuf<'_>, len: usize) -> Result<usize, CipherError> {
        if len == 0 {
            return Ok(0);
        }
        debug_assert!(len <= buf.src_len() && len <= buf.dst_len());
        let raw = self.raw.as_mut().ok_or(CipherError::Closed)?;
        let src = buf.src_ptr();
        let dst = buf.dst_ptr();
        // SAFETY: InOutBuf guarantees validity of both regions; the checked
        // regions are disjoint or in place.
        let written = unsafe { self.provider.update(raw, dst, src, len)? };
        Ok(written)
    }

    /// Finalize, writing any trailing bytes at `dst[offset..]`.
    pub(crate) fn finalize(
        &mut self,
        buf: &mut InOutBuf<'_>,
        offset: usize,
    ) -> Result<usize, CipherError> {
        let raw = self.raw.as_mut().ok_or(CipherError::Closed)?;
        // Stream modes never emit bytes at finalize; a scratch block keeps the
        // provider inside caller memory regardless.
        let mut scratch = [0u8; crate::provider::BLOCK_SIZE];
        // SAFETY: scratch is a local, writable block.
        let extra = unsafe { self.provider.finalize(raw, scratch.as_mut_ptr())? };
        if extra > 0 {
            if offset + extra > buf.dst_len() {
                return Err(ProviderError::new(
                    "EVP_CipherFinal_ex",
                    "provider emitted bytes past the output region",
                )
                .into());
            }
            buf.write_dst(offset, &scratch[..extra]);
        }
        Ok(extra)
    }

    pub(crate) fn get_tag(&mut self, tag: &mut [u8]) -> Result<(), CipherError> {
        let raw = self.raw.as_mut().ok_or(CipherError::Closed)?;
        self.provider.get_tag(raw, tag)?;
        Ok(())
    }

    pub(crate) fn set_tag(&mut self, tag: &[u8]) -> Result<(), CipherError> {
        let raw = self.raw.as_mut().ok_or(CipherError::Closed)?;
        self.provider.set_tag(raw, tag)?;
        Ok(())
    }

    /// Free the provider context now. Idempotent.
    pub(crate) fn release(&mut self) {
        if let Some(raw) = self.raw.take() {
            self.provider.free_context(raw);
            self.stats.record_released();
            trace!(algorithm = self.algorithm.name(), "native context released");
        }
    }
}

impl<P: CipherProvider> Drop for NativeContext<P> {
    fn drop(&mut self) {
        self.release();
    }
}
