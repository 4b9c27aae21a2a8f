//! AES-CBC without padding.

use std::sync::Arc;

use super::check_iv;
use crate::buffer::InOutBuf;
use crate::cipher::KeyMaterial;
use crate::context::NativeContext;
use crate::error::{CipherError, ProviderError};
use crate::provider::{Algorithm, AwsLc, BLOCK_SIZE, CipherProvider, Direction, Mode};

/// CBC encrypter or decrypter. Never both.
pub struct Cbc<P: CipherProvider = AwsLc> {
    ctx: Option<NativeContext<P>>,
    direction: Direction,
}

impl<P: CipherProvider> Cbc<P> {
    pub(crate) fn new(
        key: Arc<KeyMaterial<P>>,
        iv: &[u8],
        direction: Direction,
    ) -> Result<Self, CipherError> {
        check_iv(iv)?;
        let algorithm = Algorithm {
            key_size: key.key_size(),
            mode: Mode::Cbc,
        };
        let ctx = NativeContext::new(
            key.provider(),
            algorithm,
            key.bytes(),
            Some(iv),
            direction,
            key.stats(),
        )?;
        Ok(Self {
            ctx: Some(ctx),
            direction,
        })
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    /// Encrypt or decrypt whole blocks of `src` into `dst`.
    ///
    /// # Errors
    /// [`CipherError::BlockAlignment`] if `src` is not a multiple of 16
    /// bytes; [`CipherError::Length`] if `dst` is shorter than `src`.
    pub fn crypt_blocks(&mut self, dst: &mut [u8], src: &[u8]) -> Result<(), CipherError> {
        self.crypt_blocks_inout(InOutBuf::new(dst, src))
    }

    pub fn crypt_blocks_in_place(&mut self, buf: &mut [u8]) -> Result<(), CipherError> {
        let len = buf.len();
        self.crypt_blocks_inout(InOutBuf::in_place(buf, len)?)
    }

    pub fn crypt_blocks_inout(&mut self, mut buf: InOutBuf<'_>) -> Result<(), CipherError> {
        let ctx = self.ctx.as_mut().ok_or(CipherError::Closed)?;
        let len = buf.src_len();
        buf.check(len)?;
        if len % BLOCK_SIZE != 0 {
            return Err(CipherError::BlockAlignment(len));
        }
        if len == 0 {
            return Ok(());
        }
        let written = ctx.update(&mut buf, len)?;
        if written != len {
            return Err(ProviderError::new(
                "EVP_CipherUpdate",
                format!("CBC update of {len} bytes produced {written}"),
            )
            .into());
        }
        Ok(())
    }

    /// Restart the chain from `iv`, keeping the key schedule.
    pub fn set_iv(&mut self, iv: &[u8]) -> Result<(), CipherError> {
        check_iv(iv)?;
        self.ctx
            .as_mut()
            .ok_or(CipherError::Closed)?
            .reset_iv(iv)
    }

    pub fn is_closed(&self) -> bool {
        self.ctx.is_none()
    }

    /// Release the native context. Idempotent.
    pub fn close(&mut self) {
        self.ctx = None;
    }
}

#[cfg(test)]
mod tests {
    use crate::AesCipher;
    use crate::error::CipherError;
    use crate::testing::CountingProvider;

    // NIST SP 800-38A F.2.1
    const KEY: [u8; 16] = [
        0x2b, 0x7e, 0x15, 0x16, 0x28, 0xae, 0xd2, 0xa6, 0xab, 0xf7, 0x15, 0x88, 0x09, 0xcf, 0x4f,
        0x3c,
    ];
    const IV: [u8; 16] = [
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e,
        0x0f,
    ];
    const PLAIN: [u8; 32] = [
        0x6b, 0xc1, 0xbe, 0xe2, 0x2e, 0x40, 0x9f, 0x96, 0xe9, 0x3d, 0x7e, 0x11, 0x73, 0x93, 0x17,
        0x2a, 0xae, 0x2d, 0x8a, 0x57, 0x1e, 0x03, 0xac, 0x9c, 0x9e, 0xb7, 0x6f, 0xac, 0x45, 0xaf,
        0x8e, 0x51,
    ];
    const CIPHER: [u8; 32] = [
        0x76, 0x49, 0xab, 0xac, 0x81, 0x19, 0xb2, 0x46, 0xce, 0xe9, 0x8e, 0x9b, 0x12, 0xe9, 0x19,
        0x7d, 0x50, 0x86, 0xcb, 0x9b, 0x50, 0x72, 0x19, 0xee, 0x95, 0xdb, 0x11, 0x3a, 0x91, 0x76,
        0x78, 0xb2,
    ];

    #[test]
    fn test_known_answer() {
        let cipher = AesCipher::new(&KEY).unwrap();
        let mut enc = cipher.new_cbc_encrypter(&IV).unwrap();
        let mut out = [0u8; 32];
        enc.crypt_blocks(&mut out, &PLAIN).unwrap();
        assert_eq!(out, CIPHER);

        let mut dec = cipher.new_cbc_decrypter(&IV).unwrap();
        let mut back = [0u8; 32];
        dec.crypt_blocks(&mut back, &out).unwrap();
        assert_eq!(back, PLAIN);
    }

    #[test]
    fn test_chaining_continues_across_calls() {
        let cipher = AesCipher::new(&KEY).unwrap();
        let mut enc = cipher.new_cbc_encrypter(&IV).unwrap();
        let mut out = [0u8; 32];
        enc.crypt_blocks(&mut out[..16], &PLAIN[..16]).unwrap();
        enc.crypt_blocks(&mut out[16..], &PLAIN[16..]).unwrap();
        assert_eq!(out, CIPHER);
    }

    #[test]
    fn test_decrypt_emits_every_block() {
        // A padding-enabled provider context would hold the last block back.
        let cipher = AesCipher::new(&KEY).unwrap();
        let mut dec = cipher.new_cbc_decrypter(&IV).unwrap();
        let mut buf = CIPHER;
        dec.crypt_blocks_in_place(&mut buf[..16]).unwrap();
        assert_eq!(&buf[..16], &PLAIN[..16]);
    }

    #[test]
    fn test_set_iv_restarts_chain() {
        let cipher = AesCipher::new(&KEY).unwrap();
        let mut enc = cipher.new_cbc_encrypter(&IV).unwrap();
        let mut first = [0u8; 32];
        enc.crypt_blocks(&mut first, &PLAIN).unwrap();
        enc.set_iv(&IV).unwrap();
        let mut second = [0u8; 32];
        enc.crypt_blocks(&mut second, &PLAIN).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            enc.set_iv(&IV[..8]),
            Err(CipherError::IvLength {
                expected: 16,
                actual: 8
            })
        );
    }

    #[test]
    fn test_misaligned_and_short_rejected() {
        let cipher = AesCipher::new(&KEY).unwrap();
        let mut enc = cipher.new_cbc_encrypter(&IV).unwrap();
        let mut out = [0u8; 32];
        assert_eq!(
            enc.crypt_blocks(&mut out, &PLAIN[..17]),
            Err(CipherError::BlockAlignment(17))
        );
        assert!(matches!(
            enc.crypt_blocks(&mut out[..16], &PLAIN),
            Err(CipherError::Length { needed: 32, actual: 16 })
        ));
    }

    #[test]
    fn test_bad_iv_creates_no_context() {
        let provider = CountingProvider::new();
        let cipher = AesCipher::with_provider(&KEY, provider.clone()).unwrap();
        assert!(matches!(
            cipher.new_cbc_decrypter(&[0u8; 12]),
            Err(CipherError::IvLength { expected: 16, actual: 12 })
        ));
        assert_eq!(provider.calls(), 0);
    }

    #[test]
    fn test_empty_input_is_noop() {
        let provider = CountingProvider::new();
        let cipher = AesCipher::with_provider(&KEY, provider.clone()).unwrap();
        let mut enc = cipher.new_cbc_encrypter(&IV).unwrap();
        let before = provider.calls();
        enc.crypt_blocks(&mut [], &[]).unwrap();
        assert_eq!(provider.calls(), before);
    }

    #[test]
    fn test_close() {
        let cipher = AesCipher::new(&KEY).unwrap();
        let mut enc = cipher.new_cbc_encrypter(&IV).unwrap();
        enc.close();
        enc.close();
        assert!(enc.is_closed());
        let mut out = [0u8; 16];
        assert_eq!(
            enc.crypt_blocks(&mut out, &PLAIN[..16]),
            Err(CipherError::Closed)
        );
        let snap = cipher.context_stats();
        assert_eq!((snap.contexts_created, snap.contexts_released), (1, 1));
    }
}
