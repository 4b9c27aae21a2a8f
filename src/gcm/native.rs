//! Standard-size GCM on the provider's own GCM implementation.

use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::{
    Aead, STANDARD_NONCE_SIZE, STANDARD_TAG_SIZE, check_nonce, opened_len, sealed_len,
};
use crate::buffer::InOutBuf;
use crate::cipher::KeyMaterial;
use crate::context::NativeContext;
use crate::error::{CipherError, ProviderError};
use crate::provider::{Algorithm, AwsLc, CipherProvider, Direction, Mode};

/// 12-byte nonce, 16-byte tag. One provider context per call.
pub struct NativeGcm<P: CipherProvider = AwsLc> {
    key: Arc<KeyMaterial<P>>,
}

impl<P: CipherProvider> NativeGcm<P> {
    pub(crate) fn new(key: Arc<KeyMaterial<P>>) -> Self {
        Self { key }
    }

    fn context(&self, nonce: &[u8], direction: Direction) -> Result<NativeContext<P>, CipherError> {
        let algorithm = Algorithm {
            key_size: self.key.key_size(),
            mode: Mode::Gcm,
        };
        NativeContext::new(
            self.key.provider(),
            algorithm,
            self.key.bytes(),
            Some(nonce),
            direction,
            self.key.stats(),
        )
    }

    fn seal_native(
        &self,
        nonce: &[u8],
        buf: &mut InOutBuf<'_>,
        aad: &[u8],
        pt_len: usize,
    ) -> Result<(), CipherError> {
        let mut ctx = self.context(nonce, Direction::Encrypt)?;
        ctx.update_aad(aad)?;
        let written = ctx.update(buf, pt_len)?;
        let written = written + ctx.finalize(buf, written)?;
        if written != pt_len {
            return Err(ProviderError::new(
                "EVP_CipherFinal_ex",
                format!("GCM produced {written} bytes for {pt_len} bytes of input"),
            )
            .into());
        }
        let mut tag = [0u8; STANDARD_TAG_SIZE];
        ctx.get_tag(&mut tag)?;
        buf.write_dst(pt_len, &tag);
        Ok(())
    }

    fn open_native(
        &self,
        nonce: &[u8],
        buf: &mut InOutBuf<'_>,
        aad: &[u8],
        ct_len: usize,
        tag: &[u8],
    ) -> Result<(), CipherError> {
        let mut ctx = self.context(nonce, Direction::Decrypt)?;
        ctx.update_aad(aad)?;
        let written = ctx.update(buf, ct_len)?;
        ctx.set_tag(tag)?;
        // Tag mismatch surfaces here as a provider failure.
        let written = written + ctx.finalize(buf, written)?;
        if written != ct_len {
            return Err(ProviderError::new(
                "EVP_CipherFinal_ex",
                format!("GCM produced {written} bytes for {ct_len} bytes of input"),
            )
            .into());
        }
        Ok(())
    }
}

impl<P: CipherProvider> Aead for NativeGcm<P> {
    fn nonce_size(&self) -> usize {
        STANDARD_NONCE_SIZE
    }

    fn overhead(&self) -> usize {
        STANDARD_TAG_SIZE
    }

    fn seal_inout(
        &self,
        nonce: &[u8],
        mut buf: InOutBuf<'_>,
        aad: &[u8],
    ) -> Result<usize, CipherError> {
        check_nonce(nonce, STANDARD_NONCE_SIZE)?;
        let pt_len = buf.src_len();
        let out_len = sealed_len(pt_len, STANDARD_TAG_SIZE)?;
        buf.check(out_len)?;

        if let Err(err) = self.seal_native(nonce, &mut buf, aad, pt_len) {
            buf.zero_dst(out_len);
            return Err(err);
        }
        Ok(out_len)
    }

    fn open_inout(
        &self,
        nonce: &[u8],
        mut buf: InOutBuf<'_>,
        aad: &[u8],
    ) -> Result<usize, CipherError> {
        check_nonce(nonce, STANDARD_NONCE_SIZE)?;
        let ct_len = opened_len(buf.src_len(), STANDARD_TAG_SIZE)?;
        buf.check(ct_len)?;

        let mut tag = [0u8; STANDARD_TAG_SIZE];
        buf.read_src(ct_len, &mut tag);
        if let Err(err) = self.open_native(nonce, &mut buf, aad, ct_len, &tag) {
            buf.zero_dst(ct_len);
            self.key.stats().record_auth_failure();
            debug!(error = %err, ciphertext_len = ct_len, "GCM open rejected");
            return Err(CipherError::Authentication);
        }
        Ok(ct_len)
    }
}

impl<P: CipherProvider> fmt::Debug for NativeGcm<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeGcm")
            .field("key_size", &self.key.key_size())
            .finish_non_exhaustive()
    }
}
