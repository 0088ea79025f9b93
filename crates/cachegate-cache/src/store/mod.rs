//! Keyed byte stores with native expiry.

mod memory;
mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use async_trait::async_trait;
use cachegate_core::{CacheError, CacheResult};
use std::fmt::Debug;
use std::time::Duration;

/// Minimal command set the cache accessor needs from a backing store.
///
/// A store keeps opaque bytes per key and expires them on its own. Every write
/// is a single atomic set, so a cancelled caller never leaves a partial entry.
#[async_trait]
pub trait CacheStore: Debug + Send + Sync {
    /// Returns the bytes under `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Stores `value` under `key`, expiring after `ttl`.
    async fn set_with_expiry(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()>;

    /// Removes `key`. Returns `true` if something was removed.
    async fn delete(&self, key: &str) -> CacheResult<bool>;

    /// Returns every key matching the glob `pattern` (`*`, `?`, `[...]`).
    async fn keys(&self, pattern: &str) -> CacheResult<Vec<String>>;

    /// Remaining native TTL. `None` if the key is absent or never expires.
    async fn time_to_live(&self, key: &str) -> CacheResult<Option<Duration>>;

    /// Round-trips a no-op command.
    async fn ping(&self) -> CacheResult<()>;
}

/// Maps a Redis failure onto the error taxonomy.
///
/// Transport-level failures mean the store is unreachable; anything else is a
/// command the store rejected.
pub(crate) fn redis_error(err: &redis::RedisError, context: &str) -> CacheError {
    if err.is_io_error()
        || err.is_connection_refusal()
        || err.is_connection_dropped()
        || err.is_timeout()
    {
        CacheError::connection(format!("{}: {}", context, err))
    } else {
        CacheError::Store(format!("{}: {}", context, err))
    }
}

/// Clamps a TTL to the store's smallest expiry unit.
pub(crate) fn expiry_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}
