//! Opaque FFI handle types
//!
//! Every handle is registered in a per-type global set when created and
//! removed when freed. Freeing twice, or using a handle after free, finds no
//! registry entry and returns `FipsCipherError::InvalidHandle` instead of
//! touching freed memory.

use crate::cipher::AesCipher;
use crate::ffi::error::FipsCipherError;
use crate::gcm::Gcm;
use crate::modes::{Cbc, Ctr};
use std::collections::HashSet;
use std::sync::{LazyLock, Mutex};

static AES_HANDLES: LazyLock<Mutex<HashSet<usize>>> = LazyLock::new(|| Mutex::new(HashSet::new()));
static CBC_HANDLES: LazyLock<Mutex<HashSet<usize>>> = LazyLock::new(|| Mutex::new(HashSet::new()));
static CTR_HANDLES: LazyLock<Mutex<HashSet<usize>>> = LazyLock::new(|| Mutex::new(HashSet::new()));
static GCM_HANDLES: LazyLock<Mutex<HashSet<usize>>> = LazyLock::new(|| Mutex::new(HashSet::new()));

/// Generates an opaque `#[repr(C)]` handle over `$inner` backed by
/// `$registry`.
macro_rules! opaque_handle {
    (
        $(#[$meta:meta])*
        $handle:ident,
        $inner:ty,
        $registry:ident
    ) => {
        $(#[$meta])*
        #[repr(C)]
        pub struct $handle {
            _private: [u8; 0],
        }

        #[allow(dead_code)]
        impl $handle {
            /// Box `inner` and register the pointer.
            ///
            /// A poisoned registry could never validate the handle again, so
            /// `inner` is dropped and `Internal` returned instead.
            pub(crate) fn into_opaque_ptr(inner: $inner) -> Result<*mut Self, FipsCipherError> {
                let Ok(mut handles) = $registry.lock() else {
                    return Err(FipsCipherError::Internal);
                };
                let ptr = Box::into_raw(Box::new(inner)) as *mut Self;
                handles.insert(ptr as usize);
                Ok(ptr)
            }

            /// Unregister and unbox. `None` for null, freed or foreign
            /// pointers.
            ///
            /// # Safety
            /// On `Some` the pointer is consumed and must not be used again.
            pub(crate) unsafe fn from_opaque_ptr(ptr: *mut Self) -> Option<$inner> {
                if ptr.is_null() {
                    return None;
                }
                let addr = ptr as usize;
                let registered = $registry
                    .lock()
                    .map(|mut handles| handles.remove(&addr))
                    .unwrap_or(false);
                if !registered {
                    return None;
                }
                // SAFETY: registered pointers come from into_opaque_ptr.
                Some(unsafe { *Box::from_raw(ptr as *mut $inner) })
            }

            pub(crate) fn is_valid(ptr: *const Self) -> bool {
                if ptr.is_null() {
                    return false;
                }
                $registry
                    .lock()
                    .map(|handles| handles.contains(&(ptr as usize)))
                    .unwrap_or(false)
            }

            /// # Safety
            /// The handle must stay live for `'a`.
            pub(crate) unsafe fn as_ref<'a>(ptr: *const Self) -> Option<&'a $inner> {
                if !Self::is_valid(ptr) {
                    return None;
                }
                // SAFETY: registered, so valid and aligned.
                Some(unsafe { &*(ptr as *const $inner) })
            }

            /// # Safety
            /// The handle must stay live for `'a` with no other reference to
            /// it.
            pub(crate) unsafe fn as_mut<'a>(ptr: *mut Self) -> Option<&'a mut $inner> {
                if !Self::is_valid(ptr) {
                    return None;
                }
                // SAFETY: registered, so valid, aligned and exclusively ours
                // per the caller contract.
                Some(unsafe { &mut *(ptr as *mut $inner) })
            }
        }
    };
}

opaque_handle!(
    /// AES key handle. Create with `fips_aes_new`, free with `fips_aes_free`.
    ///
    /// Not safe for concurrent use; derived CBC/CTR/GCM handles are
    /// independent of it and of each other.
    FipsAes,
    AesCipher,
    AES_HANDLES
);

opaque_handle!(
    /// CBC encrypter or decrypter. Free with `fips_cbc_free`.
    FipsCbc,
    Cbc,
    CBC_HANDLES
);

opaque_handle!(
    /// CTR stream. Free with `fips_ctr_free`.
    FipsCtr,
    Ctr,
    CTR_HANDLES
);

opaque_handle!(
    /// GCM AEAD. Free with `fips_gcm_free`. Seal and open may be called
    /// concurrently on one handle.
    FipsGcm,
    Gcm,
    GCM_HANDLES
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aes_opaque_roundtrip() {
        let cipher = AesCipher::new(&[0u8; 16]).unwrap();
        let ptr = FipsAes::into_opaque_ptr(cipher).unwrap();
        assert!(!ptr.is_null());
        assert!(FipsAes::is_valid(ptr));

        unsafe {
            let restored = FipsAes::from_opaque_ptr(ptr);
            assert!(restored.is_some());
        }
        assert!(!FipsAes::is_valid(ptr));
    }

    #[test]
    fn test_gcm_double_free_detection() {
        let cipher = AesCipher::new(&[0u8; 16]).unwrap();
        let ptr = FipsGcm::into_opaque_ptr(cipher.new_gcm().unwrap()).unwrap();

        unsafe {
            assert!(FipsGcm::from_opaque_ptr(ptr).is_some());
            assert!(FipsGcm::from_opaque_ptr(ptr).is_none());
        }
    }

    #[test]
    fn test_null_handle() {
        let null_ptr: *mut FipsCbc = std::ptr::null_mut();
        assert!(!FipsCbc::is_valid(null_ptr));
        unsafe {
            assert!(FipsCbc::from_opaque_ptr(null_ptr).is_none());
            assert!(FipsCbc::as_ref(null_ptr).is_none());
            assert!(FipsCbc::as_mut(null_ptr).is_none());
        }
    }

    #[test]
    fn test_registries_are_per_type() {
        let cipher = AesCipher::new(&[0u8; 16]).unwrap();
        let ctr = FipsCtr::into_opaque_ptr(cipher.new_ctr(&[0u8; 16]).unwrap()).unwrap();
        assert!(!FipsCbc::is_valid(ctr as *const FipsCbc));
        unsafe {
            assert!(FipsCtr::from_opaque_ptr(ctr).is_some());
        }
    }

    static SCRATCH_HANDLES: LazyLock<Mutex<HashSet<usize>>> =
        LazyLock::new(|| Mutex::new(HashSet::new()));

    opaque_handle!(ScratchHandle, Vec<u8>, SCRATCH_HANDLES);

    #[test]
    fn test_poisoned_registry_refuses_new_handles() {
        let ptr = ScratchHandle::into_opaque_ptr(vec![1, 2, 3]).unwrap();

        let _ = std::panic::catch_unwind(|| {
            let _guard = SCRATCH_HANDLES.lock().unwrap();
            panic!("poison the registry");
        });
        assert!(SCRATCH_HANDLES.is_poisoned());

        assert_eq!(
            ScratchHandle::into_opaque_ptr(vec![4]).err(),
            Some(FipsCipherError::Internal)
        );
        // Existing handles can no longer be validated either.
        assert!(!ScratchHandle::is_valid(ptr));
    }
}
