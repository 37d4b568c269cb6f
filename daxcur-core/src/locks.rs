//! Per-key async write serialisation.
//!
//! Read-modify-write cycles against one collection must not interleave,
//! otherwise two concurrent adds can both read N records and both write
//! N+1 (lost update, duplicate id). Each key gets its own
//! `tokio::sync::Mutex` so writers for different model types never wait
//! on each other.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A registry of async mutexes, created lazily per key.
#[derive(Debug)]
pub struct KeyedLocks<K: Eq + Hash> {
    locks: DashMap<K, Arc<Mutex<()>>>,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Wait for exclusive access to `key`.
    ///
    /// The guard is owned so it can be held across `.await` points.
    pub async fn acquire(&self, key: &K) -> OwnedMutexGuard<()> {
        // Clone the Arc out before awaiting; holding a DashMap shard ref
        // across an await would block other keys in the same shard.
        let lock = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Number of keys that have been locked at least once.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no key has been locked yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}
