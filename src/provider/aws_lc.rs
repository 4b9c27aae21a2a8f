//! AWS-LC `EVP_CIPHER_CTX` provider.

#[cfg(feature = "fips")]
use aws_lc_fips_sys as aws_lc;
#[cfg(not(feature = "fips"))]
use aws_lc_sys as aws_lc;

use aws_lc::{
    CRYPTO_library_init, ERR_error_string_n, ERR_get_error, EVP_CIPHER, EVP_CIPHER_CTX,
    EVP_CIPHER_CTX_ctrl, EVP_CIPHER_CTX_free, EVP_CIPHER_CTX_new, EVP_CIPHER_CTX_set_padding,
    EVP_CipherFinal_ex, EVP_CipherInit_ex, EVP_CipherUpdate, EVP_aes_128_cbc, EVP_aes_128_ctr,
    EVP_aes_128_ecb, EVP_aes_128_gcm, EVP_aes_192_cbc, EVP_aes_192_ctr, EVP_aes_192_ecb,
    EVP_aes_192_gcm, EVP_aes_256_cbc, EVP_aes_256_ctr, EVP_aes_256_ecb, EVP_aes_256_gcm, FIPS_mode,
};
use std::ffi::{CStr, c_char, c_int, c_void};
use std::ptr::{self, NonNull};
use std::sync::Once;

use super::{Algorithm, CipherProvider, Direction, KeySize, Mode};
use crate::error::ProviderError;

// Values shared by OpenSSL and AWS-LC (`EVP_CTRL_AEAD_GET_TAG`/`SET_TAG`).
const EVP_CTRL_GCM_GET_TAG: c_int = 0x10;
const EVP_CTRL_GCM_SET_TAG: c_int = 0x11;

// Largest single update handed to the provider. A multiple of the block size
// so chunked CBC/ECB updates stay aligned.
const MAX_UPDATE_CHUNK: usize = 1 << 30;

static INIT: Once = Once::new();

fn ensure_initialized() {
    // SAFETY: library init is idempotent and thread-safe.
    INIT.call_once(|| unsafe { CRYPTO_library_init() });
}

/// Owned `EVP_CIPHER_CTX*`.
///
/// Released only through [`CipherProvider::free_context`].
#[derive(Debug)]
pub struct EvpCipherCtx(NonNull<EVP_CIPHER_CTX>);

// SAFETY: an EVP_CIPHER_CTX has no thread affinity; exclusive ownership is
// enforced by the engine through `&mut` access.
unsafe impl Send for EvpCipherCtx {}

impl EvpCipherCtx {
    fn as_ptr(&self) -> *mut EVP_CIPHER_CTX {
        self.0.as_ptr()
    }
}

/// The AWS-LC provider. Stateless; all state lives in [`EvpCipherCtx`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AwsLc;

impl AwsLc {
    pub fn new() -> Self {
        ensure_initialized();
        AwsLc
    }
}

fn evp_cipher(algorithm: Algorithm) -> *const EVP_CIPHER {
    // SAFETY: the EVP_aes_* getters return static, immutable cipher tables.
    unsafe {
        match (algorithm.key_size, algorithm.mode) {
            (KeySize::Aes128, Mode::Ecb) => EVP_aes_128_ecb(),
            (KeySize::Aes192, Mode::Ecb) => EVP_aes_192_ecb(),
            (KeySize::Aes256, Mode::Ecb) => EVP_aes_256_ecb(),
            (KeySize::Aes128, Mode::Cbc) => EVP_aes_128_cbc(),
            (KeySize::Aes192, Mode::Cbc) => EVP_aes_192_cbc(),
            (KeySize::Aes256, Mode::Cbc) => EVP_aes_256_cbc(),
            (KeySize::Aes128, Mode::Ctr) => EVP_aes_128_ctr(),
            (KeySize::Aes192, Mode::Ctr) => EVP_aes_192_ctr(),
            (KeySize::Aes256, Mode::Ctr) => EVP_aes_256_ctr(),
            (KeySize::Aes128, Mode::Gcm) => EVP_aes_128_gcm(),
            (KeySize::Aes192, Mode::Gcm) => EVP_aes_192_gcm(),
            (KeySize::Aes256, Mode::Gcm) => EVP_aes_256_gcm(),
        }
    }
}

/// Drain the thread-local provider error queue into one diagnostic string.
fn drain_errors() -> String {
    let mut messages = Vec::new();
    loop {
        // SAFETY: reads and pops the calling thread's error queue.
        let code = unsafe { ERR_get_error() };
        if code == 0 {
            break;
        }
        let mut buf = [0 as c_char; 256];
        // SAFETY: buf is writable for buf.len() bytes and is NUL-terminated
        // by ERR_error_string_n.
        let msg = unsafe {
            ERR_error_string_n(code, buf.as_mut_ptr(), buf.len());
            CStr::from_ptr(buf.as_ptr())
        };
        messages.push(msg.to_string_lossy().into_owned());
    }
    if messages.is_empty() {
        "no provider diagnostic".to_string()
    } else {
        messages.join("; ")
    }
}

fn check(rc: c_int, operation: &'static str) -> Result<(), ProviderError> {
    if rc == 1 {
        Ok(())
    } else {
        Err(ProviderError::new(operation, drain_errors()))
    }
}

fn null_if_empty(bytes: &[u8]) -> *const u8 {
    if bytes.is_empty() {
        ptr::null()
    } else {
        bytes.as_ptr()
    }
}

impl CipherProvider for AwsLc {
    type RawContext = EvpCipherCtx;

    fn create_context(&self) -> Result<EvpCipherCtx, ProviderError> {
        ensure_initialized();
        // SAFETY: allocation only; ownership moves into EvpCipherCtx.
        let raw = unsafe { EVP_CIPHER_CTX_new() };
        NonNull::new(raw)
            .map(EvpCipherCtx)
            .ok_or_else(|| ProviderError::new("EVP_CIPHER_CTX_new", drain_errors()))
    }

    fn init_context(
        &self,
        ctx: &mut EvpCipherCtx,
        algorithm: Algorithm,
        key: &[u8],
        iv: Option<&[u8]>,
        direction: Direction,
    ) -> Result<(), ProviderError> {
        let enc: c_int = match direction {
            Direction::Encrypt => 1,
            Direction::Decrypt => 0,
        };
        let iv_ptr = iv.map_or(ptr::null(), null_if_empty);
        // SAFETY: ctx is live; key and iv outlive the call and the provider
        // copies them into the context.
        let rc = unsafe {
            EVP_CipherInit_ex(
                ctx.as_ptr(),
                evp_cipher(algorithm),
                ptr::null_mut(),
                null_if_empty(key),
                iv_ptr,
                enc,
            )
        };
        check(rc, "EVP_CipherInit_ex")
    }

    fn reset_iv(&self, ctx: &mut EvpCipherCtx, iv: &[u8]) -> Result<(), ProviderError> {
        // SAFETY: a null cipher and key keep the existing schedule; -1 keeps
        // the direction.
        let rc = unsafe {
            EVP_CipherInit_ex(
                ctx.as_ptr(),
                ptr::null(),
                ptr::null_mut(),
                ptr::null(),
                iv.as_ptr(),
                -1,
            )
        };
        check(rc, "EVP_CipherInit_ex")
    }

    unsafe fn update(
        &self,
        ctx: &mut EvpCipherCtx,
        out: *mut u8,
        input: *const u8,
        len: usize,
    ) -> Result<usize, ProviderError> {
        let mut written = 0usize;
        let mut offset = 0usize;
        while offset < len {
            let chunk = (len - offset).min(MAX_UPDATE_CHUNK);
            let mut out_len: c_int = 0;
            let out_ptr = if out.is_null() {
                out
            } else {
                // SAFETY: caller guarantees out is valid for len bytes.
                unsafe { out.add(written) }
            };
            // SAFETY: pointer validity is the caller's contract; chunk fits
            // in c_int because MAX_UPDATE_CHUNK < i32::MAX.
            let rc = unsafe {
                EVP_CipherUpdate(
                    ctx.as_ptr(),
                    out_ptr,
                    &mut out_len,
                    input.add(offset),
                    chunk as c_int,
                )
            };
            check(rc, "EVP_CipherUpdate")?;
            written += usize::try_from(out_len).unwrap_or(0);
            offset += chunk;
        }
        Ok(written)
    }

    unsafe fn finalize(
        &self,
        ctx: &mut EvpCipherCtx,
        out: *mut u8,
    ) -> Result<usize, ProviderError> {
        let mut out_len: c_int = 0;
        // SAFETY: caller guarantees out is valid for one block.
        let rc = unsafe { EVP_CipherFinal_ex(ctx.as_ptr(), out, &mut out_len) };
        check(rc, "EVP_CipherFinal_ex")?;
        Ok(usize::try_from(out_len).unwrap_or(0))
    }

    fn set_padding(&self, ctx: &mut EvpCipherCtx, enabled: bool) -> Result<(), ProviderError> {
        // SAFETY: ctx is live and initialized.
        let rc = unsafe { EVP_CIPHER_CTX_set_padding(ctx.as_ptr(), c_int::from(enabled)) };
        check(rc, "EVP_CIPHER_CTX_set_padding")
    }

    fn get_tag(&self, ctx: &mut EvpCipherCtx, tag: &mut [u8]) -> Result<(), ProviderError> {
        let len = c_int::try_from(tag.len())
            .map_err(|_| ProviderError::new("EVP_CTRL_GCM_GET_TAG", "tag too long"))?;
        // SAFETY: tag is writable for len bytes.
        let rc = unsafe {
            EVP_CIPHER_CTX_ctrl(
                ctx.as_ptr(),
                EVP_CTRL_GCM_GET_TAG,
                len,
                tag.as_mut_ptr() as *mut c_void,
            )
        };
        check(rc, "EVP_CIPHER_CTX_ctrl(GET_TAG)")
    }

    fn set_tag(&self, ctx: &mut EvpCipherCtx, tag: &[u8]) -> Result<(), ProviderError> {
        let len = c_int::try_from(tag.len())
            .map_err(|_| ProviderError::new("EVP_CTRL_GCM_SET_TAG", "tag too long"))?;
        // SAFETY: SET_TAG only reads len bytes from the pointer.
        let rc = unsafe {
            EVP_CIPHER_CTX_ctrl(
                ctx.as_ptr(),
                EVP_CTRL_GCM_SET_TAG,
                len,
                tag.as_ptr() as *mut c_void,
            )
        };
        check(rc, "EVP_CIPHER_CTX_ctrl(SET_TAG)")
    }

    fn free_context(&self, ctx: EvpCipherCtx) {
        // SAFETY: ctx is consumed, so the pointer cannot be freed twice.
        unsafe { EVP_CIPHER_CTX_free(ctx.as_ptr()) };
    }

    fn fips_mode(&self) -> bool {
        ensure_initialized();
        // SAFETY: pure status query.
        unsafe { FIPS_mode() == 1 }
    }
}
