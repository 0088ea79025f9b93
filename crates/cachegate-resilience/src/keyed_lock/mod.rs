//! Per-key advisory locks.
//!
//! A waiter for key `a` never blocks a waiter for key `b`. Entries are
//! removed from the map as soon as the last holder or waiter lets go, so the
//! map only ever holds keys with an in-flight miss.

use cachegate_core::CacheError;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

type LockMap = DashMap<String, Arc<Mutex<()>>>;

/// A set of short-lived mutexes keyed by string.
#[derive(Debug, Clone)]
pub struct KeyedLocks {
    locks: Arc<LockMap>,
    timeout: Duration,
}

impl KeyedLocks {
    /// Creates a lock set whose waiters give up after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
            timeout,
        }
    }

    /// Returns the configured wait timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Acquires the lock for `key`.
    ///
    /// Returns `CacheError::Timeout` if the current holder does not release
    /// it within the configured timeout.
    pub async fn acquire(&self, key: &str) -> Result<KeyGuard, CacheError> {
        let mutex = {
            let entry = self
                .locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())));
            Arc::clone(entry.value())
        };

        match tokio::time::timeout(self.timeout, mutex.lock_owned()).await {
            Ok(guard) => {
                trace!(key = %key, "Acquired key lock");
                Ok(KeyGuard {
                    locks: Arc::clone(&self.locks),
                    key: key.to_string(),
                    guard: Some(guard),
                })
            }
            Err(_) => {
                remove_if_idle(&self.locks, key);
                Err(CacheError::Timeout(format!(
                    "Lock for key '{}' not released within {:?}",
                    key, self.timeout
                )))
            }
        }
    }

    /// Returns the number of keys that currently have a holder or waiter.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Returns true if no key is locked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

fn remove_if_idle(locks: &LockMap, key: &str) {
    locks.remove_if(key, |_, mutex| Arc::strong_count(mutex) == 1);
}

/// Holds the lock for one key until dropped.
#[derive(Debug)]
pub struct KeyGuard {
    locks: Arc<LockMap>,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyGuard {
    /// The key this guard protects.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        // The guard owns a reference to the mutex; release it before
        // checking whether anyone else still does.
        drop(self.guard.take());
        remove_if_idle(&self.locks, &self.key);
        trace!(key = %self.key, "Released key lock");
    }
}
