//! Provider wrapper that counts native calls, for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::ProviderError;
use crate::provider::{Algorithm, AwsLc, CipherProvider, Direction, EvpCipherCtx};

#[derive(Debug, Default)]
struct Counters {
    calls: AtomicUsize,
    created: AtomicUsize,
    freed: AtomicUsize,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct CountingProvider {
    inner: AwsLc,
    counters: Arc<Counters>,
}

impl CountingProvider {
    pub(crate) fn new() -> Self {
        Self {
            inner: AwsLc::new(),
            counters: Arc::default(),
        }
    }

    /// Every provider call, including create and free.
    pub(crate) fn calls(&self) -> usize {
        self.counters.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn created(&self) -> usize {
        self.counters.created.load(Ordering::SeqCst)
    }

    pub(crate) fn freed(&self) -> usize {
        self.counters.freed.load(Ordering::SeqCst)
    }

    fn tick(&self) {
        self.counters.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl CipherProvider for CountingProvider {
    type RawContext = EvpCipherCtx;

    fn create_context(&self) -> Result<EvpCipherCtx, ProviderError> {
        self.tick();
        self.counters.created.fetch_add(1, Ordering::SeqCst);
        self.inner.create_context()
    }

    fn init_context(
        &self,
        ctx: &mut EvpCipherCtx,
        algorithm: Algorithm,
        key: &[u8],
        iv: Option<&[u8]>,
        direction: Direction,
    ) -> Result<(), ProviderError> {
        self.tick();
        self.inner.init_context(ctx, algorithm, key, iv, direction)
    }

    fn reset_iv(&self, ctx: &mut EvpCipherCtx, iv: &[u8]) -> Result<(), ProviderError> {
        self.tick();
        self.inner.reset_iv(ctx, iv)
    }

    unsafe fn update(
        &self,
        ctx: &mut EvpCipherCtx,
        out: *mut u8,
        input: *const u8,
        len: usize,
    ) -> Result<usize, ProviderError> {
        self.tick();
        // SAFETY: forwarded caller contract.
        unsafe { self.inner.update(ctx, out, input, len) }
    }

    unsafe fn finalize(
        &self,
        ctx: &mut EvpCipherCtx,
        out: *mut u8,
    ) -> Result<usize, ProviderError> {
        self.tick();
        // SAFETY: forwarded caller contract.
        unsafe { self.inner.finalize(ctx, out) }
    }

    fn set_padding(&self, ctx: &mut EvpCipherCtx, enabled: bool) -> Result<(), ProviderError> {
        self.tick();
        self.inner.set_padding(ctx, enabled)
    }

    fn get_tag(&self, ctx: &mut EvpCipherCtx, tag: &mut [u8]) -> Result<(), ProviderError> {
        self.tick();
        self.inner.get_tag(ctx, tag)
    }

    fn set_tag(&self, ctx: &mut EvpCipherCtx, tag: &[u8]) -> Result<(), ProviderError> {
        self.tick();
        self.inner.set_tag(ctx, tag)
    }

    fn free_context(&self, ctx: EvpCipherCtx) {
        self.tick();
        self.counters.freed.fetch_add(1, Ordering::SeqCst);
        self.inner.free_context(ctx)
    }

    fn fips_mode(&self) -> bool {
        self.inner.fips_mode()
    }
}
