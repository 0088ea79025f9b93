//! Cache-aside accessor.
//!
//! Every operation names the store by connection identity and opens it
//! through the [`ConnectionRegistry`]. On a miss the accessor produces a
//! response (an upstream fetch or a constant), stamps it with the TTL, writes
//! it with the same native expiry, and returns it. Hits are returned exactly
//! as stored.

use crate::expiration::KeyExpirationTuple;
use crate::fetcher::Fetcher;
use crate::message::media::TEXT_PLAIN;
use crate::message::{SerializedRequest, SerializedResponse, DEFAULT_TTL};
use crate::registry::ConnectionRegistry;
use crate::store::CacheStore;
use async_trait::async_trait;
use cachegate_config::CacheConfig;
use cachegate_core::{CacheError, CacheResult, PageRequest, Pager};
use cachegate_resilience::{KeyGuard, KeyedLocks};
use chrono::{DateTime, TimeDelta, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Pattern used when a listing does not supply one.
pub const MATCH_ALL: &str = "*";

/// Cache-aside operations over a named store.
#[async_trait]
pub trait CacheAccessor: Send + Sync {
    /// Returns the stored response for `key`, or replays `request` and stores
    /// the result for `ttl` (default TTL if `None`).
    ///
    /// A fetch that yields no response is answered with
    /// [`SerializedResponse::not_found`] and nothing is stored.
    async fn get_or_fetch(
        &self,
        identity: &str,
        key: &str,
        request: SerializedRequest,
        ttl: Option<Duration>,
    ) -> CacheResult<SerializedResponse>;

    /// [`get_or_fetch`](Self::get_or_fetch) with a plain `GET` of `url`.
    async fn get_or_fetch_url(
        &self,
        identity: &str,
        key: &str,
        url: &str,
        ttl: Option<Duration>,
    ) -> CacheResult<SerializedResponse> {
        self.get_or_fetch(identity, key, SerializedRequest::get(url), ttl)
            .await
    }

    /// Returns the stored response for `key`, or stores a `200` whose payload
    /// is `value`. The MIME type defaults to `text/plain`.
    async fn get_or_fetch_constant(
        &self,
        identity: &str,
        key: &str,
        value: &str,
        mime_type: Option<&str>,
        ttl: Option<Duration>,
    ) -> CacheResult<SerializedResponse>;

    /// Every key matching the glob `pattern`, in store order.
    async fn list_keys(&self, identity: &str, pattern: &str) -> CacheResult<Vec<String>>;

    /// One page of [`list_keys`](Self::list_keys). No matches at all gives
    /// [`Pager::not_found`].
    async fn list_keys_page(
        &self,
        identity: &str,
        pattern: &str,
        page: PageRequest,
    ) -> CacheResult<Pager<String>> {
        let keys = self.list_keys(identity, pattern).await?;
        Ok(Pager::from_items(keys, page))
    }

    /// Instant the store will expire `key`, or `None` if it is absent or
    /// never expires.
    async fn key_expiration(&self, identity: &str, key: &str) -> CacheResult<Option<DateTime<Utc>>>;

    /// Native TTL of `key` together with the TTL it was stored with.
    async fn key_expiration_tuple(
        &self,
        identity: &str,
        key: &str,
    ) -> CacheResult<Option<KeyExpirationTuple>>;

    /// Removes `key`. Returns `false` if it was not there.
    async fn delete(&self, identity: &str, key: &str) -> CacheResult<bool>;

    /// Checks that the store for `identity` answers.
    async fn ping(&self, identity: &str) -> CacheResult<()>;
}

/// Accessor tuning.
#[derive(Debug, Clone)]
pub struct AccessorSettings {
    pub default_ttl: Duration,
    /// Serialize concurrent misses on the same key.
    pub per_key_locking: bool,
    pub lock_timeout: Duration,
}

impl AccessorSettings {
    #[must_use]
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            default_ttl: config.default_ttl(),
            per_key_locking: config.per_key_locking,
            lock_timeout: config.lock_timeout(),
        }
    }
}

impl Default for AccessorSettings {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            per_key_locking: true,
            lock_timeout: CacheConfig::default().lock_timeout(),
        }
    }
}

/// What a miss produced.
enum Miss {
    /// Store and return.
    Store(SerializedResponse),
    /// Return without storing.
    Transient(SerializedResponse),
}

/// [`CacheAccessor`] over the registry's stores.
pub struct CacheAccessorImpl {
    registry: Arc<ConnectionRegistry>,
    fetcher: Arc<dyn Fetcher>,
    locks: Option<KeyedLocks>,
    default_ttl: Duration,
}

impl CacheAccessorImpl {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        fetcher: Arc<dyn Fetcher>,
        settings: AccessorSettings,
    ) -> Self {
        let locks = settings
            .per_key_locking
            .then(|| KeyedLocks::new(settings.lock_timeout));

        Self {
            registry,
            fetcher,
            locks,
            default_ttl: settings.default_ttl,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    async fn get_or_populate<F, Fut>(
        &self,
        identity: &str,
        key: &str,
        populate: F,
    ) -> CacheResult<SerializedResponse>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = CacheResult<Miss>> + Send,
    {
        validate_key(key)?;
        let store = self.registry.acquire(identity).await?;

        if let Some(hit) = read_hit(store.as_ref(), key).await? {
            return Ok(hit);
        }

        let guard = self.lock(identity, key).await;
        if guard.is_some() {
            // Another caller may have filled the key while we waited.
            if let Some(hit) = read_hit(store.as_ref(), key).await? {
                return Ok(hit);
            }
        }

        match populate().await? {
            Miss::Store(response) => {
                let ttl = response.original_expiration();
                let bytes = response.encode()?;
                store.set_with_expiry(key, &bytes, ttl).await?;

                info!(
                    event = "PUT",
                    key = %key,
                    status = response.status_code(),
                    ttl_secs = ttl.as_secs_f64(),
                    "Stored response"
                );
                Ok(response)
            }
            Miss::Transient(response) => Ok(response),
        }
    }

    /// The caller's TTL, or the default, bounded by [`CacheConfig::MAX_TTL`].
    fn resolve_ttl(&self, ttl: Option<Duration>) -> CacheResult<Duration> {
        let ttl = ttl.unwrap_or(self.default_ttl);
        if ttl > CacheConfig::MAX_TTL {
            return Err(CacheError::validation(format!(
                "TTL of {}s exceeds the maximum of {}s",
                ttl.as_secs(),
                CacheConfig::MAX_TTL.as_secs()
            )));
        }
        Ok(ttl)
    }

    async fn lock(&self, identity: &str, key: &str) -> Option<KeyGuard> {
        let locks = self.locks.as_ref()?;
        match locks.acquire(&format!("{}\n{}", identity, key)).await {
            Ok(guard) => Some(guard),
            Err(e) => {
                warn!(key = %key, error = %e, "Proceeding without key lock");
                None
            }
        }
    }
}

impl std::fmt::Debug for CacheAccessorImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheAccessorImpl")
            .field("registry", &self.registry)
            .field("per_key_locking", &self.locks.is_some())
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CacheAccessor for CacheAccessorImpl {
    async fn get_or_fetch(
        &self,
        identity: &str,
        key: &str,
        request: SerializedRequest,
        ttl: Option<Duration>,
    ) -> CacheResult<SerializedResponse> {
        let ttl = self.resolve_ttl(ttl)?;
        let fetcher = Arc::clone(&self.fetcher);

        self.get_or_populate(identity, key, || async move {
            match fetcher.fetch(&request).await {
                Ok(upstream) => Ok(Miss::Store(SerializedResponse::from_upstream(upstream, ttl))),
                Err(e) if e.is_downgradable() => {
                    warn!(key = %key, uri = %request.uri, error = %e, "Upstream fetch failed, answering not found");
                    Ok(Miss::Transient(SerializedResponse::not_found()))
                }
                Err(e) => Err(e),
            }
        })
        .await
    }

    async fn get_or_fetch_constant(
        &self,
        identity: &str,
        key: &str,
        value: &str,
        mime_type: Option<&str>,
        ttl: Option<Duration>,
    ) -> CacheResult<SerializedResponse> {
        let ttl = self.resolve_ttl(ttl)?;
        let mime_type = mime_type.unwrap_or(TEXT_PLAIN);

        self.get_or_populate(identity, key, || async move {
            Ok(Miss::Store(SerializedResponse::constant(value, mime_type, ttl)))
        })
        .await
    }

    async fn list_keys(&self, identity: &str, pattern: &str) -> CacheResult<Vec<String>> {
        let pattern = if pattern.is_empty() { MATCH_ALL } else { pattern };
        let store = self.registry.acquire(identity).await?;
        let keys = store.keys(pattern).await?;

        info!(event = "FIND", pattern = %pattern, count = keys.len(), "Listed keys");
        Ok(keys)
    }

    async fn key_expiration(&self, identity: &str, key: &str) -> CacheResult<Option<DateTime<Utc>>> {
        validate_key(key)?;
        let store = self.registry.acquire(identity).await?;

        store
            .time_to_live(key)
            .await?
            .map(expiration_from_now)
            .transpose()
    }

    async fn key_expiration_tuple(
        &self,
        identity: &str,
        key: &str,
    ) -> CacheResult<Option<KeyExpirationTuple>> {
        validate_key(key)?;
        let store = self.registry.acquire(identity).await?;

        let Some(current) = store.time_to_live(key).await? else {
            return Ok(None);
        };

        let original = match store.get(key).await? {
            Some(bytes) => match SerializedResponse::decode(&bytes) {
                Ok(response) => Some(response.original_expiration()),
                Err(e) => {
                    debug!(key = %key, error = %e, "Stored entry is not a response");
                    None
                }
            },
            None => None,
        };

        Ok(Some(KeyExpirationTuple {
            key: key.to_string(),
            original_time_to_live: original,
            current_time_to_live: current,
            expiration: expiration_from_now(current)?,
        }))
    }

    async fn delete(&self, identity: &str, key: &str) -> CacheResult<bool> {
        validate_key(key)?;
        let store = self.registry.acquire(identity).await?;
        let removed = store.delete(key).await?;

        info!(event = "DELETE", key = %key, removed, "Deleted key");
        Ok(removed)
    }

    async fn ping(&self, identity: &str) -> CacheResult<()> {
        self.registry.acquire(identity).await?.ping().await
    }
}

fn validate_key(key: &str) -> CacheResult<()> {
    if key.is_empty() {
        return Err(CacheError::validation("Cache key cannot be empty"));
    }
    Ok(())
}

async fn read_hit(store: &dyn CacheStore, key: &str) -> CacheResult<Option<SerializedResponse>> {
    let Some(bytes) = store.get(key).await? else {
        return Ok(None);
    };

    let response = SerializedResponse::decode(&bytes)?;
    debug!(
        event = "GET",
        key = %key,
        status = response.status_code(),
        content_type = %response.content_type(),
        "Cache hit"
    );
    Ok(Some(response))
}

fn expiration_from_now(ttl: Duration) -> CacheResult<DateTime<Utc>> {
    TimeDelta::from_std(ttl)
        .ok()
        .and_then(|delta| Utc::now().checked_add_signed(delta))
        .ok_or_else(|| CacheError::internal(format!("TTL out of range: {:?}", ttl)))
}
