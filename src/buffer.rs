//! Pre-flight buffer checks run before any native call writes into caller
//! memory.
//!
//! Safe Rust slices can never partially overlap, but raw callers (the C ABI)
//! can hand in any pair of pointers. [`InOutBuf`] carries a source and a
//! destination region as raw parts so the same checks cover both worlds:
//! regions must be disjoint or start at the same address (in place).

use std::marker::PhantomData;
use std::ptr;

use crate::error::CipherError;

/// Fails with [`CipherError::Overlap`] when two non-empty regions share bytes
/// without starting at the same address.
pub fn check_no_overlap(
    dst: *const u8,
    dst_len: usize,
    src: *const u8,
    src_len: usize,
) -> Result<(), CipherError> {
    if dst_len == 0 || src_len == 0 || dst == src {
        return Ok(());
    }
    let (dst_start, src_start) = (dst as usize, src as usize);
    let dst_end = dst_start.saturating_add(dst_len);
    let src_end = src_start.saturating_add(src_len);
    if dst_start < src_end && src_start < dst_end {
        return Err(CipherError::Overlap);
    }
    Ok(())
}

/// Fails with [`CipherError::Length`] when `len < needed`.
pub fn check_min_length(len: usize, needed: usize) -> Result<(), CipherError> {
    if len < needed {
        return Err(CipherError::Length {
            needed,
            actual: len,
        });
    }
    Ok(())
}

/// A source region and a destination region that are either disjoint or
/// exactly in place.
///
/// Construction from safe slices can only produce those two shapes; raw
/// construction is checked by [`InOutBuf::check`] before first use.
#[derive(Debug)]
pub struct InOutBuf<'a> {
    src: *const u8,
    src_len: usize,
    dst: *mut u8,
    dst_len: usize,
    _marker: PhantomData<&'a mut [u8]>,
}

impl<'a> InOutBuf<'a> {
    /// Disjoint source and destination.
    pub fn new(dst: &'a mut [u8], src: &'a [u8]) -> Self {
        Self {
            src: src.as_ptr(),
            src_len: src.len(),
            dst: dst.as_mut_ptr(),
            dst_len: dst.len(),
            _marker: PhantomData,
        }
    }

    /// In-place transform of the first `src_len` bytes of `buf`; the output
    /// may use the whole of `buf`.
    pub fn in_place(buf: &'a mut [u8], src_len: usize) -> Result<Self, CipherError> {
        check_min_length(buf.len(), src_len)?;
        let dst = buf.as_mut_ptr();
        Ok(Self {
            src: dst as *const u8,
            src_len,
            dst,
            dst_len: buf.len(),
            _marker: PhantomData,
        })
    }

    /// Build from raw parts.
    ///
    /// # Safety
    /// `src` must be valid for reads of `src_len` bytes and `dst` valid for
    /// writes of `dst_len` bytes for `'a`. Either may be null only when its
    /// length is zero. Overlap is allowed here and rejected by `check`.
    pub unsafe fn from_raw(dst: *mut u8, dst_len: usize, src: *const u8, src_len: usize) -> Self {
        Self {
            src,
            src_len,
            dst,
            dst_len,
            _marker: PhantomData,
        }
    }

    pub fn src_len(&self) -> usize {
        self.src_len
    }

    pub fn dst_len(&self) -> usize {
        self.dst_len
    }

    pub fn is_in_place(&self) -> bool {
        self.src_len > 0 && ptr::eq(self.src, self.dst as *const u8)
    }

    /// Run both buffer checks: the destination must hold `dst_needed` bytes
    /// and the first `dst_needed` bytes must not partially overlap the source.
    pub fn check(&self, dst_needed: usize) -> Result<(), CipherError> {
        check_min_length(self.dst_len, dst_needed)?;
        check_no_overlap(self.dst, dst_needed, self.src, self.src_len)
    }

    pub(crate) fn src_ptr(&self) -> *const u8 {
        self.src
    }

    pub(crate) fn dst_ptr(&mut self) -> *mut u8 {
        self.dst
    }

    /// Source bytes. Borrowing `self` keeps any destination write out of the
    /// slice's lifetime.
    pub(crate) fn src(&self) -> &[u8] {
        if self.src_len == 0 {
            return &[];
        }
        // SAFETY: validity for src_len bytes is the constructor's contract;
        // no &mut to dst can exist while &self is borrowed.
        unsafe { std::slice::from_raw_parts(self.src, self.src_len) }
    }

    /// Destination bytes `[..len]` as written so far.
    pub(crate) fn dst(&self, len: usize) -> &[u8] {
        let len = len.min(self.dst_len);
        if len == 0 {
            return &[];
        }
        // SAFETY: as for `src`.
        unsafe { std::slice::from_raw_parts(self.dst, len) }
    }

    /// Copy `src[offset..offset + out.len()]` into `out`.
    pub(crate) fn read_src(&self, offset: usize, out: &mut [u8]) {
        debug_assert!(offset + out.len() <= self.src_len);
        // SAFETY: bounds checked above; out is a local buffer so it cannot
        // alias either region.
        unsafe { ptr::copy_nonoverlapping(self.src.add(offset), out.as_mut_ptr(), out.len()) }
    }

    /// Copy `bytes` into `dst[offset..]`.
    pub(crate) fn write_dst(&mut self, offset: usize, bytes: &[u8]) {
        debug_assert!(offset + bytes.len() <= self.dst_len);
        // SAFETY: bounds checked above; bytes is a local buffer.
        unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), self.dst.add(offset), bytes.len()) }
    }

    /// Overwrite `dst[..len]` with zeros.
    pub(crate) fn zero_dst(&mut self, len: usize) {
        let len = len.min(self.dst_len);
        if len == 0 {
            return;
        }
        // SAFETY: dst is valid for dst_len >= len bytes.
        unsafe { ptr::write_bytes(self.dst, 0, len) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_overlap_allowed() {
        let buf = [0u8; 32];
        assert!(check_no_overlap(buf.as_ptr(), 32, buf.as_ptr(), 32).is_ok());
        assert!(check_no_overlap(buf.as_ptr(), 32, buf.as_ptr(), 16).is_ok());
    }

    #[test]
    fn test_partial_overlap_rejected() {
        let buf = [0u8; 32];
        let base = buf.as_ptr();
        let shifted = unsafe { base.add(1) };
        assert_eq!(
            check_no_overlap(shifted, 16, base, 16),
            Err(CipherError::Overlap)
        );
        assert_eq!(
            check_no_overlap(base, 16, shifted, 16),
            Err(CipherError::Overlap)
        );
    }

    #[test]
    fn test_adjacent_regions_allowed() {
        let buf = [0u8; 32];
        let base = buf.as_ptr();
        let second = unsafe { base.add(16) };
        assert!(check_no_overlap(base, 16, second, 16).is_ok());
        assert!(check_no_overlap(second, 16, base, 16).is_ok());
    }

    #[test]
    fn test_empty_regions_never_overlap() {
        let buf = [0u8; 32];
        let base = buf.as_ptr();
        let shifted = unsafe { base.add(3) };
        assert!(check_no_overlap(shifted, 0, base, 16).is_ok());
        assert!(check_no_overlap(shifted, 16, base, 0).is_ok());
    }

    #[test]
    fn test_min_length() {
        assert!(check_min_length(16, 16).is_ok());
        assert_eq!(
            check_min_length(15, 16),
            Err(CipherError::Length {
                needed: 16,
                actual: 15
            })
        );
    }

    #[test]
    fn test_in_place_requires_room_for_source() {
        let mut buf = [0u8; 8];
        assert!(InOutBuf::in_place(&mut buf, 9).is_err());
        let io = InOutBuf::in_place(&mut buf, 8).unwrap();
        assert!(io.is_in_place());
        assert!(io.check(8).is_ok());
    }

    #[test]
    fn test_raw_partial_overlap_fails_check() {
        let mut backing = [0u8; 48];
        let base = backing.as_mut_ptr();
        let io = unsafe { InOutBuf::from_raw(base.add(8), 16, base, 16) };
        assert!(!io.is_in_place());
        assert_eq!(io.check(16), Err(CipherError::Overlap));
    }

    #[test]
    fn test_zero_dst() {
        let mut dst = [0xAAu8; 8];
        let src = [1u8; 8];
        let mut io = InOutBuf::new(&mut dst, &src);
        io.write_dst(0, &[7, 7]);
        assert_eq!(io.dst(2), &[7, 7]);
        io.zero_dst(6);
        assert_eq!(dst, [0, 0, 0, 0, 0, 0, 0xAA, 0xAA]);
    }
}
