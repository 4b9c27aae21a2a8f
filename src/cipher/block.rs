//! Single-block operate on a lazily created ECB context.

use std::sync::Arc;

use super::KeyMaterial;
use crate::buffer::InOutBuf;
use crate::context::NativeContext;
use crate::error::{CipherError, ProviderError};
use crate::provider::{Algorithm, AwsLc, BLOCK_SIZE, CipherProvider, Direction, Mode};

enum State<P: CipherProvider> {
    Uninitialized,
    Ready(NativeContext<P>),
    Closed,
}

/// One direction of raw AES block operation.
///
/// `Uninitialized` until the first block, then `Ready` with a single reused
/// native context, then `Closed` after [`close`](Self::close). Use after close
/// fails with [`CipherError::Closed`].
pub struct BlockContext<P: CipherProvider = AwsLc> {
    key: Arc<KeyMaterial<P>>,
    direction: Direction,
    state: State<P>,
}

impl<P: CipherProvider> BlockContext<P> {
    pub(crate) fn new(key: Arc<KeyMaterial<P>>, direction: Direction) -> Self {
        Self {
            key,
            direction,
            state: State::Uninitialized,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, State::Ready(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    /// Transform the first block of `src` into the first block of `dst`.
    pub fn crypt_block(&mut self, dst: &mut [u8], src: &[u8]) -> Result<(), CipherError> {
        self.crypt_block_inout(InOutBuf::new(dst, src))
    }

    /// Transform the first block of `block` in place.
    pub fn crypt_block_in_place(&mut self, block: &mut [u8]) -> Result<(), CipherError> {
        let len = block.len();
        self.crypt_block_inout(InOutBuf::in_place(block, len)?)
    }

    pub fn crypt_block_inout(&mut self, mut buf: InOutBuf<'_>) -> Result<(), CipherError> {
        if self.is_closed() {
            return Err(CipherError::Closed);
        }
        if buf.src_len() < BLOCK_SIZE {
            return Err(CipherError::Length {
                needed: BLOCK_SIZE,
                actual: buf.src_len(),
            });
        }
        buf.check(BLOCK_SIZE)?;

        let written = self.ready()?.update(&mut buf, BLOCK_SIZE)?;
        if written != BLOCK_SIZE {
            return Err(ProviderError::new(
                "EVP_CipherUpdate",
                format!("single-block update produced {written} bytes"),
            )
            .into());
        }
        Ok(())
    }

    /// Encrypt one 16-byte block in place. Used by the generic GCM
    /// composition for keystream and hash-subkey blocks.
    pub(crate) fn encrypt_array(&mut self, block: &mut [u8; BLOCK_SIZE]) -> Result<(), CipherError> {
        debug_assert_eq!(self.direction, Direction::Encrypt);
        self.crypt_block_in_place(block)
    }

    fn ready(&mut self) -> Result<&mut NativeContext<P>, CipherError> {
        if let State::Uninitialized = self.state {
            let algorithm = Algorithm {
                key_size: self.key.key_size(),
                mode: Mode::Ecb,
            };
            let ctx = NativeContext::new(
                self.key.provider(),
                algorithm,
                self.key.bytes(),
                None,
                self.direction,
                self.key.stats(),
            )?;
            self.state = State::Ready(ctx);
        }
        match &mut self.state {
            State::Ready(ctx) => Ok(ctx),
            _ => Err(CipherError::Closed),
        }
    }

    /// Release the native context, if any. Idempotent.
    pub fn close(&mut self) {
        // Dropping the old state frees its context.
        self.state = State::Closed;
    }
}
