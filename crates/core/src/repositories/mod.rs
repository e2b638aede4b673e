//! Shared entity repositories.
//!
//! One repository per entity type, each holding a single shared cache with
//! explicit invalidation, so the three interactive surfaces read the same
//! state instead of re-fetching independently. Caches are replaced only
//! after the authority confirms a mutation (confirm-then-apply).

pub mod donations;
pub mod requests;

use std::sync::{Mutex, MutexGuard};

/// Locks a cache mutex, recovering from poisoning: a panicking reader cannot
/// leave cached snapshots inconsistent.
pub(crate) fn lock_cache<T>(cache: &Mutex<T>) -> MutexGuard<'_, T> {
    cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
