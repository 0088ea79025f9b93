//! Redis-backed store.

use super::{expiry_millis, redis_error, CacheStore};
use async_trait::async_trait;
use cachegate_core::{CacheError, CacheResult};
use cachegate_resilience::with_timeout;
use deadpool_redis::redis::{cmd, AsyncCommands};
use deadpool_redis::{Config, Pool, Runtime};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

/// Store over a pooled set of Redis connections.
///
/// The pool multiplexes any number of concurrent callers; clones share it.
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool,
}

impl RedisStore {
    /// Creates a pool for `url` and verifies it with `PING`.
    ///
    /// Fails with `Connection` if the server cannot be reached within
    /// `connect_timeout`.
    pub async fn connect(url: &str, pool_size: usize, connect_timeout: Duration) -> CacheResult<Self> {
        info!(pool_size, "Creating Redis connection pool...");

        let pool = Config::from_url(url)
            .builder()
            .map_err(|e| CacheError::Configuration(format!("Invalid Redis config: {}", e)))?
            .max_size(pool_size)
            .runtime(Runtime::Tokio1)
            .wait_timeout(Some(connect_timeout))
            .create_timeout(Some(connect_timeout))
            .build()
            .map_err(|e| CacheError::Configuration(format!("Failed to create pool: {}", e)))?;

        let store = Self::from_pool(pool);
        with_timeout(connect_timeout, || store.ping())
            .await
            .map_err(|e| match e {
                CacheError::Timeout(message) => CacheError::connection(message),
                other => other,
            })?;

        info!("Redis connection pool created successfully");
        Ok(store)
    }

    /// Wraps an existing pool without verifying it.
    #[must_use]
    pub const fn from_pool(pool: Pool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> CacheResult<deadpool_redis::Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::connection(format!("Failed to get Redis connection: {}", e)))
    }
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("status", &self.pool.status())
            .finish()
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut conn = self.conn().await?;
        conn.get(key)
            .await
            .map_err(|e| redis_error(&e, &format!("Failed to get key '{}'", key)))
    }

    async fn set_with_expiry(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        let millis = expiry_millis(ttl);

        conn.pset_ex::<_, _, ()>(key, value, millis)
            .await
            .map_err(|e| redis_error(&e, &format!("Failed to set key '{}'", key)))?;

        debug!(key = %key, ttl_ms = millis, "Stored key in Redis");
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.conn().await?;
        let deleted: i64 = conn
            .del(key)
            .await
            .map_err(|e| redis_error(&e, &format!("Failed to delete key '{}'", key)))?;
        Ok(deleted > 0)
    }

    async fn keys(&self, pattern: &str) -> CacheResult<Vec<String>> {
        let mut conn = self.conn().await?;

        // KEYS gathers the full set in one round-trip.
        cmd("KEYS")
            .arg(pattern)
            .query_async(&mut conn)
            .await
            .map_err(|e| redis_error(&e, &format!("Failed to list keys '{}'", pattern)))
    }

    async fn time_to_live(&self, key: &str) -> CacheResult<Option<Duration>> {
        let mut conn = self.conn().await?;
        let millis: i64 = conn
            .pttl(key)
            .await
            .map_err(|e| redis_error(&e, &format!("Failed to read TTL of '{}'", key)))?;

        // -2: absent, -1: no expiry
        Ok(u64::try_from(millis).ok().map(Duration::from_millis))
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| redis_error(&e, "PING failed"))?;
        Ok(())
    }
}
