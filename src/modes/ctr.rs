//! AES-CTR keystream.

use std::sync::Arc;

use super::check_iv;
use crate::buffer::InOutBuf;
use crate::cipher::KeyMaterial;
use crate::context::NativeContext;
use crate::error::{CipherError, ProviderError};
use crate::provider::{Algorithm, AwsLc, CipherProvider, Direction, Mode};

/// CTR stream. Encryption and decryption are the same operation, so the
/// native context always runs in the encrypt direction.
pub struct Ctr<P: CipherProvider = AwsLc> {
    ctx: Option<NativeContext<P>>,
}

impl<P: CipherProvider> Ctr<P> {
    pub(crate) fn new(key: Arc<KeyMaterial<P>>, iv: &[u8]) -> Result<Self, CipherError> {
        check_iv(iv)?;
        let algorithm = Algorithm {
            key_size: key.key_size(),
            mode: Mode::Ctr,
        };
        let ctx = NativeContext::new(
            key.provider(),
            algorithm,
            key.bytes(),
            Some(iv),
            Direction::Encrypt,
            key.stats(),
        )?;
        Ok(Self { ctx: Some(ctx) })
    }

    /// XOR `src` with the next `src.len()` keystream bytes into `dst`.
    pub fn xor_key_stream(&mut self, dst: &mut [u8], src: &[u8]) -> Result<(), CipherError> {
        self.xor_key_stream_inout(InOutBuf::new(dst, src))
    }

    pub fn apply_keystream(&mut self, buf: &mut [u8]) -> Result<(), CipherError> {
        let len = buf.len();
        self.xor_key_stream_inout(InOutBuf::in_place(buf, len)?)
    }

    pub fn xor_key_stream_inout(&mut self, mut buf: InOutBuf<'_>) -> Result<(), CipherError> {
        let ctx = self.ctx.as_mut().ok_or(CipherError::Closed)?;
        let len = buf.src_len();
        buf.check(len)?;
        if len == 0 {
            return Ok(());
        }
        let written = ctx.update(&mut buf, len)?;
        if written != len {
            return Err(ProviderError::new(
                "EVP_CipherUpdate",
                format!("CTR update of {len} bytes produced {written}"),
            )
            .into());
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.ctx.is_none()
    }

    /// Release the native context. Idempotent.
    pub fn close(&mut self) {
        self.ctx = None;
    }
}
