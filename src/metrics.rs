//! Native context accounting
//!
//! Every [`crate::AesCipher`] shares one [`ContextStats`] with the objects
//! derived from it. Counters move only when a provider context is created or
//! freed, so `created == released` once everything is dropped is the leak and
//! double-free audit.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters, shared behind an `Arc`.
#[derive(Debug, Default)]
pub struct ContextStats {
    created: AtomicU64,
    released: AtomicU64,
    auth_failures: AtomicU64,
}

impl ContextStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_created(&self) {
        self.created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_released(&self) {
        self.released.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_auth_failure(&self) {
        self.auth_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters.
    pub fn snapshot(&self) -> ContextStatsSnapshot {
        let contexts_created = self.created.load(Ordering::Relaxed);
        let contexts_released = self.released.load(Ordering::Relaxed);
        ContextStatsSnapshot {
            contexts_created,
            contexts_released,
            contexts_live: contexts_created.saturating_sub(contexts_released),
            auth_failures: self.auth_failures.load(Ordering::Relaxed),
        }
    }
}

/// Serializable view of [`ContextStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextStatsSnapshot {
    /// Native contexts created by this handle and its derived objects
    pub contexts_created: u64,

    /// Native contexts freed
    pub contexts_released: u64,

    /// Contexts currently held
    pub contexts_live: u64,

    /// GCM opens rejected with an authentication failure
    pub auth_failures: u64,
}
