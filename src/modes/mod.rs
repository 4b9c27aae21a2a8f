//! Chained-block and keystream modes.
//!
//! Each adapter owns one native context initialized at construction with the
//! key, IV and a fixed direction. Chaining and counter state live inside that
//! context, so consecutive calls continue the same stream.

pub mod cbc;
pub mod ctr;

pub use cbc::Cbc;
pub use ctr::Ctr;

use crate::error::CipherError;
use crate::provider::BLOCK_SIZE;

fn check_iv(iv: &[u8]) -> Result<(), CipherError> {
    if iv.len() != BLOCK_SIZE {
        return Err(CipherError::IvLength {
            expected: BLOCK_SIZE,
            actual: iv.len(),
        });
    }
    Ok(())
}
