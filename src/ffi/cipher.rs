//! C FFI wrappers for the cipher handle, CBC, CTR and GCM.
//!
//! All functions:
//! - are wrapped in `catch_unwind` and never unwind into C
//! - accept a null pointer only for a zero-length region
//! - run the same overlap checks as the Rust API, so `dst == src` works in
//!   place and partial aliasing returns `FipsCipherError::Overlap`

use std::panic::catch_unwind;
use std::slice;

use crate::buffer::InOutBuf;
use crate::cipher::AesCipher;
use crate::ffi::error::FipsCipherError;
use crate::ffi::handles::{FipsAes, FipsCbc, FipsCtr, FipsGcm};
use crate::gcm::Aead;

/// Borrow `len` bytes at `ptr`. Null is accepted only when `len == 0`.
unsafe fn slice_arg<'a>(ptr: *const u8, len: usize) -> Result<&'a [u8], FipsCipherError> {
    if len == 0 {
        return Ok(&[]);
    }
    if ptr.is_null() {
        return Err(FipsCipherError::NullPointer);
    }
    // SAFETY: non-null; validity for len bytes is the caller's contract.
    Ok(unsafe { slice::from_raw_parts(ptr, len) })
}

unsafe fn inout_arg<'a>(
    dst: *mut u8,
    dst_len: usize,
    src: *const u8,
    src_len: usize,
) -> Result<InOutBuf<'a>, FipsCipherError> {
    if (dst.is_null() && dst_len > 0) || (src.is_null() && src_len > 0) {
        return Err(FipsCipherError::NullPointer);
    }
    // SAFETY: forwarded caller contract; overlap is checked before use.
    Ok(unsafe { InOutBuf::from_raw(dst, dst_len, src, src_len) })
}

unsafe fn set_error(error_out: *mut FipsCipherError, code: FipsCipherError) {
    if !error_out.is_null() {
        // SAFETY: non-null, caller-provided out parameter.
        unsafe { *error_out = code };
    }
}

/// Create an AES handle from a copy of `key`.
///
/// # Returns
/// A handle to free with `fips_aes_free`, or null on failure with
/// `*error_out` set (`InvalidKeySize`, `NullPointer`).
///
/// # Safety
/// `key` must be readable for `key_len` bytes. `error_out` may be null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fips_aes_new(
    key: *const u8,
    key_len: usize,
    error_out: *mut FipsCipherError,
) -> *mut FipsAes {
    let result = catch_unwind(|| {
        let key = unsafe { slice_arg(key, key_len) }?;
        AesCipher::new(key)
            .map_err(FipsCipherError::from)
            .and_then(FipsAes::into_opaque_ptr)
    });

    match result {
        Ok(Ok(ptr)) => {
            unsafe { set_error(error_out, FipsCipherError::Ok) };
            ptr
        }
        Ok(Err(e)) => {
            unsafe { set_error(error_out, e) };
            std::ptr::null_mut()
        }
        Err(_) => {
            unsafe { set_error(error_out, FipsCipherError::Internal) };
            std::ptr::null_mut()
        }
    }
}

/// Free an AES handle. Null, freed and unknown handles are ignored.
///
/// Handles derived from it stay valid.
///
/// # Safety
/// `handle` must not be used after this call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fips_aes_free(handle: *mut FipsAes) {
    let _ = catch_unwind(|| {
        // SAFETY: Some means we own it and drop it here.
        unsafe {
            let _cipher = FipsAes::from_opaque_ptr(handle);
        }
    });
}

/// Encrypt the first 16 bytes of `src` into the first 16 bytes of `dst`.
///
/// # Safety
/// `src` readable for `src_len` bytes, `dst` writable for `dst_len` bytes.
/// Not safe to call concurrently on one handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fips_aes_encrypt_block(
    handle: *mut FipsAes,
    dst: *mut u8,
    dst_len: usize,
    src: *const u8,
    src_len: usize,
) -> FipsCipherError {
    let result = catch_unwind(|| {
        let Some(cipher) = (unsafe { FipsAes::as_mut(handle) }) else {
            return FipsCipherError::InvalidHandle;
        };
        match unsafe { inout_arg(dst, dst_len, src, src_len) } {
            Ok(buf) => cipher.encrypt_block_inout(buf).into(),
            Err(e) => e,
        }
    });

    result.unwrap_or(FipsCipherError::Internal)
}

/// Decrypt the first 16 bytes of `src` into the first 16 bytes of `dst`.
///
/// # Safety
/// As for `fips_aes_encrypt_block`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fips_aes_decrypt_block(
    handle: *mut FipsAes,
    dst: *mut u8,
    dst_len: usize,
    src: *const u8,
    src_len: usize,
) -> FipsCipherError {
    let result = catch_unwind(|| {
        let Some(cipher) = (unsafe { FipsAes::as_mut(handle) }) else {
            return FipsCipherError::InvalidHandle;
        };
        match unsafe { inout_arg(dst, dst_len, src, src_len) } {
            Ok(buf) => cipher.decrypt_block_inout(buf).into(),
            Err(e) => e,
        }
    });

    result.unwrap_or(FipsCipherError::Internal)
}

/// Create a CBC encrypter (`encrypt == true`) or decrypter.
///
/// # Safety
/// `aes` must be a live handle; `iv` readable for `iv_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fips_cbc_new(
    aes: *const FipsAes,
    iv: *const u8,
    iv_len: usize,
    encrypt: bool,
    error_out: *mut FipsCipherError,
) -> *mut FipsCbc {
    let result = catch_unwind(|| {
        let Some(cipher) = (unsafe { FipsAes::as_ref(aes) }) else {
            return Err(FipsCipherError::InvalidHandle);
        };
        let iv = unsafe { slice_arg(iv, iv_len) }?;
        let cbc = if encrypt {
            cipher.new_cbc_encrypter(iv)
        } else {
            cipher.new_cbc_decrypter(iv)
        };
        cbc.map_err(FipsCipherError::from)
            .and_then(FipsCbc::into_opaque_ptr)
    });

    match result {
        Ok(Ok(ptr)) => {
            unsafe { set_error(error_out, FipsCipherError::Ok) };
            ptr
        }
        Ok(Err(e)) => {
            unsafe { set_error(error_out, e) };
            std::ptr::null_mut()
        }
        Err(_) => {
            unsafe { set_error(error_out, FipsCipherError::Internal) };
            std::ptr::null_mut()
        }
    }
}

/// Free a CBC handle. Null, freed and unknown handles are ignored.
///
/// # Safety
/// `handle` must not be used after this call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fips_cbc_free(handle: *mut FipsCbc) {
    let _ = catch_unwind(|| unsafe {
        let _cbc = FipsCbc::from_opaque_ptr(handle);
    });
}

/// Encrypt or decrypt `src_len` bytes (a multiple of 16) into `dst`.
///
/// # Safety
/// `src` readable for `src_len` bytes, `dst` writable for `dst_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fips_cbc_crypt_blocks(
    handle: *mut FipsCbc,
    dst: *mut u8,
    dst_len: usize,
    src: *const u8,
    src_len: usize,
) -> FipsCipherError {
    let result = catch_unwind(|| {
        let Some(cbc) = (unsafe { FipsCbc::as_mut(handle) }) else {
            return FipsCipherError::InvalidHandle;
        };
        match unsafe { inout_arg(dst, dst_len, src, src_len) } {
            Ok(buf) => cbc.crypt_blocks_inout(buf).into(),
            Err(e) => e,
        }
    });

    result.unwrap_or(FipsCipherError::Internal)
}

/// Restart the CBC chain from a new 16-byte IV.
///
/// # Safety
/// `iv` readable for `iv_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fips_cbc_set_iv(
    handle: *mut FipsCbc,
    iv: *const u8,
    iv_len: usize,
) -> FipsCipherError {
    let result = catch_unwind(|| {
        let Some(cbc) = (unsafe { FipsCbc::as_mut(handle) }) else {
            return FipsCipherError::InvalidHandle;
        };
        match unsafe { slice_arg(iv, iv_len) } {
            Ok(iv) => cbc.set_iv(iv).into(),
            Err(e) => e,
        }
    });

    result.unwrap_or(FipsCipherError::Internal)
}

/// Create a CTR stream starting at the 16-byte counter block `iv`.
///
/// # Safety
/// `aes` must be a live handle; `iv` readable for `iv_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fips_ctr_new(
    aes: *const FipsAes,
    iv: *const u8,
    iv_len: usize,
    error_out: *mut FipsCipherError,
) -> *mut FipsCtr {
    let result = catch_unwind(|| {
        let Some(cipher) = (unsafe { FipsAes::as_ref(aes) }) else {
            return Err(FipsCipherError::InvalidHandle);
        };
        let iv = unsafe { slice_arg(iv, iv_len) }?;
        cipher
            .new_ctr(iv)
            .map_err(FipsCipherError::from)
            .and_then(FipsCtr::into_opaque_ptr)
    });

    match result {
        Ok(Ok(ptr)) => {
            unsafe { set_error(error_out, FipsCipherError::Ok) };
            ptr
        }
        Ok(Err(e)) => {
            unsafe { set_error(error_out, e) };
            std::ptr::null_mut()
        }
        Err(_) => {
            unsafe { set_error(error_out, FipsCipherError::Internal) };
            std::ptr::null_mut()
        }
    }
}

/// Free a CTR handle. Null, freed and unknown handles are ignored.
///
/// # Safety
/// `handle` must not be used after this call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fips_ctr_free(handle: *mut FipsCtr) {
    let _ = catch_unwind(|| unsafe {
        let _ctr = FipsCtr::from_opaque_ptr(handle);
    });
}

/// XOR `src_len` bytes of `src` with the keystream into `dst`.
///
/// # Safety
/// `src` readable for `src_len` bytes, `dst` writable for `dst_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fips_ctr_xor_key_stream(
    handle: *mut FipsCtr,
    dst: *mut u8,
    dst_len: usize,
    src: *const u8,
    src_len: usize,
) -> FipsCipherError {
    let result = catch_unwind(|| {
        let Some(ctr) = (unsafe { FipsCtr::as_mut(handle) }) else {
            return FipsCipherError::InvalidHandle;
        };
        match unsafe { inout_arg(dst, dst_len, src, src_len) } {
            Ok(buf) => ctr.xor_key_stream_inout(buf).into(),
            Err(e) => e,
        }
    });

    result.unwrap_or(FipsCipherError::Internal)
}

/// Create a GCM AEAD. Pass (12, 16) for the standard native path.
///
/// # Safety
/// `aes` must be a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fips_gcm_new(
    aes: *const FipsAes,
    nonce_size: usize,
    tag_size: usize,
    error_out: *mut FipsCipherError,
) -> *mut FipsGcm {
    let result = catch_unwind(|| {
        let Some(cipher) = (unsafe { FipsAes::as_ref(aes) }) else {
            return Err(FipsCipherError::InvalidHandle);
        };
        cipher
            .new_gcm_with_sizes(nonce_size, tag_size)
            .map_err(FipsCipherError::from)
            .and_then(FipsGcm::into_opaque_ptr)
    });

    match result {
        Ok(Ok(ptr)) => {
            unsafe { set_error(error_out, FipsCipherError::Ok) };
            ptr
        }
        Ok(Err(e)) => {
            unsafe { set_error(error_out, e) };
            std::ptr::null_mut()
        }
        Err(_) => {
            unsafe { set_error(error_out, FipsCipherError::Internal) };
            std::ptr::null_mut()
        }
    }
}

/// Free a GCM handle. Null, freed and unknown handles are ignored.
///
/// # Safety
/// `handle` must not be used after this call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fips_gcm_free(handle: *mut FipsGcm) {
    let _ = catch_unwind(|| unsafe {
        let _gcm = FipsGcm::from_opaque_ptr(handle);
    });
}

/// Seal `plaintext` into `output` as `ciphertext || tag`.
///
/// # Parameters
/// - `output_len`: on input the size of `output`; on output the bytes
///   written, or the required size if `BufferTooSmall` is returned
///
/// `output` may equal `plaintext` for in-place sealing.
///
/// # Safety
/// Every pointer must be valid for its stated length; `output_len` must be
/// non-null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fips_gcm_seal(
    handle: *const FipsGcm,
    nonce: *const u8,
    nonce_len: usize,
    aad: *const u8,
    aad_len: usize,
    plaintext: *const u8,
    plaintext_len: usize,
    output: *mut u8,
    output_len: *mut usize,
) -> FipsCipherError {
    let result = catch_unwind(|| {
        if output_len.is_null() {
            return FipsCipherError::NullPointer;
        }
        let Some(gcm) = (unsafe { FipsGcm::as_ref(handle) }) else {
            return FipsCipherError::InvalidHandle;
        };
        let Some(required) = plaintext_len.checked_add(gcm.overhead()) else {
            return FipsCipherError::MessageTooLarge;
        };
        // SAFETY: output_len checked non-null.
        let available = unsafe { *output_len };
        if available < required {
            unsafe { *output_len = required };
            return FipsCipherError::BufferTooSmall;
        }

        let args = unsafe {
            slice_arg(nonce, nonce_len).and_then(|nonce| {
                let aad = slice_arg(aad, aad_len)?;
                let buf = inout_arg(output, available, plaintext, plaintext_len)?;
                Ok((nonce, aad, buf))
            })
        };
        let (nonce, aad, buf) = match args {
            Ok(args) => args,
            Err(e) => return e,
        };
        match gcm.seal_inout(nonce, buf, aad) {
            Ok(written) => {
                unsafe { *output_len = written };
                FipsCipherError::Ok
            }
            Err(e) => e.into(),
        }
    });

    result.unwrap_or(FipsCipherError::Internal)
}

/// Open `ciphertext || tag` into `output`.
///
/// On `AuthenticationFailed` the first `ciphertext_len - tag` bytes of
/// `output` are zero and `*output_len` is 0.
///
/// # Parameters
/// - `output_len`: on input the size of `output`; on output the plaintext
///   length, or the required size if `BufferTooSmall` is returned
///
/// # Safety
/// Every pointer must be valid for its stated length; `output_len` must be
/// non-null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fips_gcm_open(
    handle: *const FipsGcm,
    nonce: *const u8,
    nonce_len: usize,
    aad: *const u8,
    aad_len: usize,
    ciphertext: *const u8,
    ciphertext_len: usize,
    output: *mut u8,
    output_len: *mut usize,
) -> FipsCipherError {
    let result = catch_unwind(|| {
        if output_len.is_null() {
            return FipsCipherError::NullPointer;
        }
        let Some(gcm) = (unsafe { FipsGcm::as_ref(handle) }) else {
            return FipsCipherError::InvalidHandle;
        };
        let required = ciphertext_len.saturating_sub(gcm.overhead());
        // SAFETY: output_len checked non-null.
        let available = unsafe { *output_len };
        if available < required {
            unsafe { *output_len = required };
            return FipsCipherError::BufferTooSmall;
        }

        let args = unsafe {
            slice_arg(nonce, nonce_len).and_then(|nonce| {
                let aad = slice_arg(aad, aad_len)?;
                let buf = inout_arg(output, available, ciphertext, ciphertext_len)?;
                Ok((nonce, aad, buf))
            })
        };
        let (nonce, aad, buf) = match args {
            Ok(args) => args,
            Err(e) => return e,
        };
        let (written, code) = match gcm.open_inout(nonce, buf, aad) {
            Ok(written) => (written, FipsCipherError::Ok),
            Err(e) => (0, e.into()),
        };
        unsafe { *output_len = written };
        code
    });

    result.unwrap_or(FipsCipherError::Internal)
}

/// Nonce size of a GCM handle, or 0 for an invalid handle.
///
/// # Safety
/// `handle` may be any pointer; invalid handles return 0.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fips_gcm_nonce_size(handle: *const FipsGcm) -> usize {
    catch_unwind(|| unsafe { FipsGcm::as_ref(handle) }.map_or(0, |gcm| gcm.nonce_size()))
        .unwrap_or(0)
}

/// Tag size of a GCM handle, or 0 for an invalid handle.
///
/// # Safety
/// `handle` may be any pointer; invalid handles return 0.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fips_gcm_overhead(handle: *const FipsGcm) -> usize {
    catch_unwind(|| unsafe { FipsGcm::as_ref(handle) }.map_or(0, |gcm| gcm.overhead()))
        .unwrap_or(0)
}

/// Whether the linked provider runs in FIPS mode.
#[unsafe(no_mangle)]
pub extern "C" fn fips_cipher_fips_mode() -> bool {
    catch_unwind(crate::fips_mode).unwrap_or(false)
}
