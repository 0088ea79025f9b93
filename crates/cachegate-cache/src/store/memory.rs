//! In-process store selected by `memory://<name>` identities.

use super::{expiry_millis, CacheStore};
use async_trait::async_trait;
use cachegate_core::{CacheError, CacheResult};
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// Concurrent map with lazy expiry.
///
/// Expired entries are dropped when next touched, or in bulk on `keys`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, including expired ones not yet evicted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn with_live<T>(&self, key: &str, now: Instant, f: impl FnOnce(&Entry) -> T) -> Option<T> {
        match self.entries.get(key) {
            None => return None,
            Some(entry) if entry.is_live(now) => return Some(f(&entry)),
            Some(_) => {}
        }
        self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        None
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        Ok(self.with_live(key, Instant::now(), |entry| entry.value.clone()))
    }

    async fn set_with_expiry(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()> {
        let expires_at = Instant::now().checked_add(Duration::from_millis(expiry_millis(ttl)));
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove(key)
            .is_some_and(|(_, entry)| entry.is_live(now)))
    }

    async fn keys(&self, pattern: &str) -> CacheResult<Vec<String>> {
        let matcher = glob::Pattern::new(pattern).map_err(|e| {
            CacheError::validation(format!("Invalid key pattern '{}': {}", pattern, e))
        })?;

        let now = Instant::now();
        self.entries.retain(|_, entry| entry.is_live(now));

        Ok(self
            .entries
            .iter()
            .filter(|item| matcher.matches(item.key()))
            .map(|item| item.key().clone())
            .collect())
    }

    async fn time_to_live(&self, key: &str) -> CacheResult<Option<Duration>> {
        let now = Instant::now();
        Ok(self
            .with_live(key, now, |entry| {
                entry
                    .expires_at
                    .map(|at| at.saturating_duration_since(now))
            })
            .flatten())
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }
}
