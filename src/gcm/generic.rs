//! GCM built from the raw block cipher, for nonce or tag sizes the
//! provider's GCM cannot take.
//!
//! J0 is `nonce || 0^31 || 1` for a 12-byte nonce and
//! `GHASH_H(nonce || pad || 0^64 || [len(nonce)]_64)` otherwise. Data is
//! counter-mode encrypted from `inc32(J0)`; the tag is the first `tag_size`
//! bytes of `E(J0) ^ GHASH_H(aad || ct || lengths)`.

use ghash::GHash;
use ghash::universal_hash::{KeyInit, UniversalHash};
use std::fmt;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::debug;
use zeroize::Zeroizing;

use super::{
    Aead, MIN_TAG_SIZE, STANDARD_NONCE_SIZE, STANDARD_TAG_SIZE, check_nonce, opened_len,
    sealed_len,
};
use crate::buffer::InOutBuf;
use crate::cipher::{BlockContext, KeyMaterial};
use crate::error::CipherError;
use crate::provider::{AwsLc, BLOCK_SIZE, CipherProvider, Direction};

type Block = [u8; BLOCK_SIZE];

/// GCM composed over [`BlockContext`] with caller-chosen sizes.
pub struct GenericGcm<P: CipherProvider = AwsLc> {
    key: Arc<KeyMaterial<P>>,
    nonce_size: usize,
    tag_size: usize,
}

/// Per-call state: a fresh encrypting block context, the hash subkey and
/// the pre-counter block.
struct Invocation<P: CipherProvider> {
    block: BlockContext<P>,
    hash_key: Zeroizing<Block>,
    j0: Zeroizing<Block>,
}

impl<P: CipherProvider> GenericGcm<P> {
    /// # Errors
    /// [`CipherError::UnsupportedSize`] for an empty nonce or a tag outside
    /// 12..=16 bytes.
    pub(crate) fn new(
        key: Arc<KeyMaterial<P>>,
        nonce_size: usize,
        tag_size: usize,
    ) -> Result<Self, CipherError> {
        if nonce_size == 0 || !(MIN_TAG_SIZE..=STANDARD_TAG_SIZE).contains(&tag_size) {
            return Err(CipherError::UnsupportedSize {
                nonce_size,
                tag_size,
            });
        }
        Ok(Self {
            key,
            nonce_size,
            tag_size,
        })
    }

    fn start(&self, nonce: &[u8]) -> Result<Invocation<P>, CipherError> {
        let mut block = BlockContext::new(Arc::clone(&self.key), Direction::Encrypt);

        let mut hash_key = Zeroizing::new([0u8; BLOCK_SIZE]);
        block.encrypt_array(&mut hash_key)?;

        let mut j0 = Zeroizing::new([0u8; BLOCK_SIZE]);
        if nonce.len() == STANDARD_NONCE_SIZE {
            j0[..STANDARD_NONCE_SIZE].copy_from_slice(nonce);
            j0[BLOCK_SIZE - 1] = 1;
        } else {
            let mut ghash = GHash::new(ghash::Key::from_slice(&hash_key[..]));
            ghash.update_padded(nonce);
            let mut lengths = [0u8; BLOCK_SIZE];
            lengths[8..].copy_from_slice(&bit_len(nonce.len()).to_be_bytes());
            ghash.update_padded(&lengths);
            j0.copy_from_slice(&ghash.finalize());
        }

        Ok(Invocation {
            block,
            hash_key,
            j0,
        })
    }

    /// Counter-mode transform of the first `len` source bytes into the
    /// destination, counting up from `inc32(J0)`.
    fn ctr(
        &self,
        inv: &mut Invocation<P>,
        buf: &mut InOutBuf<'_>,
        len: usize,
    ) -> Result<(), CipherError> {
        let mut counter = Zeroizing::new(*inv.j0);
        let mut keystream = Zeroizing::new([0u8; BLOCK_SIZE]);
        let mut chunk = Zeroizing::new([0u8; BLOCK_SIZE]);
        let mut offset = 0;
        while offset < len {
            inc32(&mut counter);
            keystream.copy_from_slice(&counter[..]);
            inv.block.encrypt_array(&mut keystream)?;

            let n = (len - offset).min(BLOCK_SIZE);
            buf.read_src(offset, &mut chunk[..n]);
            for (c, k) in chunk[..n].iter_mut().zip(keystream.iter()) {
                *c ^= k;
            }
            buf.write_dst(offset, &chunk[..n]);
            offset += n;
        }
        Ok(())
    }

    fn tag(
        &self,
        inv: &mut Invocation<P>,
        aad: &[u8],
        ciphertext: &[u8],
    ) -> Result<Zeroizing<Block>, CipherError> {
        let mut ghash = GHash::new(ghash::Key::from_slice(&inv.hash_key[..]));
        ghash.update_padded(aad);
        ghash.update_padded(ciphertext);
        let mut lengths = [0u8; BLOCK_SIZE];
        lengths[..8].copy_from_slice(&bit_len(aad.len()).to_be_bytes());
        lengths[8..].copy_from_slice(&bit_len(ciphertext.len()).to_be_bytes());
        ghash.update_padded(&lengths);
        let s = ghash.finalize();

        let mut tag = Zeroizing::new(*inv.j0);
        inv.block.encrypt_array(&mut tag)?;
        for (t, x) in tag.iter_mut().zip(s.iter()) {
            *t ^= x;
        }
        Ok(tag)
    }

    fn seal_generic(
        &self,
        nonce: &[u8],
        buf: &mut InOutBuf<'_>,
        aad: &[u8],
        pt_len: usize,
    ) -> Result<(), CipherError> {
        let mut inv = self.start(nonce)?;
        self.ctr(&mut inv, buf, pt_len)?;
        let tag = self.tag(&mut inv, aad, buf.dst(pt_len))?;
        buf.write_dst(pt_len, &tag[..self.tag_size]);
        Ok(())
    }

    fn open_generic(
        &self,
        nonce: &[u8],
        buf: &mut InOutBuf<'_>,
        aad: &[u8],
        ct_len: usize,
    ) -> Result<(), CipherError> {
        let mut inv = self.start(nonce)?;
        let (ciphertext, received) = buf.src().split_at(ct_len);
        let expected = self.tag(&mut inv, aad, ciphertext)?;
        if !bool::from(expected[..self.tag_size].ct_eq(received)) {
            return Err(CipherError::Authentication);
        }
        self.ctr(&mut inv, buf, ct_len)
    }
}

impl<P: CipherProvider> Aead for GenericGcm<P> {
    fn nonce_size(&self) -> usize {
        self.nonce_size
    }

    fn overhead(&self) -> usize {
        self.tag_size
    }

    fn seal_inout(
        &self,
        nonce: &[u8],
        mut buf: InOutBuf<'_>,
        aad: &[u8],
    ) -> Result<usize, CipherError> {
        check_nonce(nonce, self.nonce_size)?;
        let pt_len = buf.src_len();
        let out_len = sealed_len(pt_len, self.tag_size)?;
        buf.check(out_len)?;

        if let Err(err) = self.seal_generic(nonce, &mut buf, aad, pt_len) {
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
        check_nonce(nonce, self.nonce_size)?;
        let ct_len = opened_len(buf.src_len(), self.tag_size)?;
        buf.check(ct_len)?;

        if let Err(err) = self.open_generic(nonce, &mut buf, aad, ct_len) {
            buf.zero_dst(ct_len);
            self.key.stats().record_auth_failure();
            debug!(error = %err, ciphertext_len = ct_len, "GCM open rejected");
            return Err(CipherError::Authentication);
        }
        Ok(ct_len)
    }
}

impl<P: CipherProvider> fmt::Debug for GenericGcm<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericGcm")
            .field("key_size", &self.key.key_size())
            .field("nonce_size", &self.nonce_size)
            .field("tag_size", &self.tag_size)
            .finish_non_exhaustive()
    }
}

fn bit_len(len: usize) -> u64 {
    (len as u64).wrapping_mul(8)
}

fn inc32(block: &mut Block) {
    let mut ctr = [0u8; 4];
    ctr.copy_from_slice(&block[12..]);
    let next = u32::from_be_bytes(ctr).wrapping_add(1);
    block[12..].copy_from_slice(&next.to_be_bytes());
}
