//! Application configuration structures.

use cachegate_core::telemetry::{LogFormat, LoggingConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name and metadata.
    #[serde(default)]
    pub app: AppMetadata,

    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Backing store and cache behaviour.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Outbound fetch configuration.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Application metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppMetadata {
    /// Application name.
    pub name: String,
    /// Application version.
    pub version: String,
    /// Environment (development, staging, production).
    pub environment: String,
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self {
            name: "cachegate".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen host.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
    /// Enable CORS.
    pub cors_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 60,
            max_body_size: 10 * 1024 * 1024, // 10MB
            cors_enabled: true,
        }
    }
}

impl ServerConfig {
    /// Returns the listen address.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the request timeout as a Duration.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Backing store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Connection identity of the backing store.
    ///
    /// `redis://` and `rediss://` select Redis; `memory://<name>` selects the
    /// in-process store.
    pub connection_string: String,
    /// TTL applied when a caller does not supply one.
    pub default_ttl_secs: u64,
    /// Redis connection pool size per identity.
    pub pool_size: usize,
    /// Timeout for establishing a store connection.
    pub connect_timeout_secs: u64,
    /// Serialize concurrent misses on the same key.
    pub per_key_locking: bool,
    /// How long a miss waits for another caller's fetch on the same key.
    ///
    /// Must not be shorter than `upstream.timeout_secs`.
    pub lock_timeout_ms: u64,
    /// Page size used by key listings when none is requested.
    pub default_page_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            connection_string: "redis://localhost:6379".to_string(),
            default_ttl_secs: 86_400, // 24 hours
            pool_size: 10,
            connect_timeout_secs: 5,
            per_key_locking: true,
            lock_timeout_ms: 35_000, // upstream timeout plus margin
            default_page_size: 50,
        }
    }
}

impl CacheConfig {
    /// Longest TTL an entry may be stored with (ten years).
    ///
    /// Keeps expirations representable as Redis milliseconds and as
    /// `chrono` instants.
    pub const MAX_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

    /// Returns the default TTL as a Duration.
    #[must_use]
    pub const fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    /// Returns the connect timeout as a Duration.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Returns the per-key lock timeout as a Duration.
    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

/// Outbound HTTP fetch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Timeout for a single upstream fetch in seconds.
    pub timeout_secs: u64,
    /// User agent sent when the request does not carry one.
    pub user_agent: String,
    /// Idle connections kept per upstream host.
    pub pool_max_idle_per_host: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("cachegate/{}", env!("CARGO_PKG_VERSION")),
            pool_max_idle_per_host: 32,
        }
    }
}

impl UpstreamConfig {
    /// Returns the fetch timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Log format (json, pretty).
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

impl ObservabilityConfig {
    /// Converts to the logging settings understood by `cachegate-core`.
    ///
    /// An unknown format falls back to `pretty`; the validator reports it.
    #[must_use]
    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level.to_lowercase(),
            format: self.log_format.parse().unwrap_or(LogFormat::Pretty),
        }
    }
}
