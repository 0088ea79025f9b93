//! Configuration validation module.
//!
//! Collects every invalid value in one pass so a misconfigured deployment
//! fails once with the full list rather than one error per restart.

use crate::AppConfig;
use std::fmt;
use url::Url;

/// Configuration validation error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    /// Port number is invalid (must be 1-65535).
    InvalidPort { name: String, value: u16 },
    /// Pool size is outside the supported range.
    InvalidPoolSize { value: usize, minimum: usize, maximum: usize },
    /// Connection string cannot be used.
    InvalidConnectionString { message: String },
    /// Timeout or TTL value must be positive.
    NonPositiveValue { name: String },
    /// Value exceeds its upper bound.
    ValueTooLarge { name: String, maximum: u64 },
    /// Log level is invalid.
    InvalidLogLevel { value: String },
    /// Log format is invalid.
    InvalidLogFormat { value: String },
    /// A waiter on the per-key lock would give up before the fetch it waits for.
    LockTimeoutTooShort {
        lock_timeout_ms: u64,
        upstream_timeout_secs: u64,
    },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPort { name, value } => {
                write!(f, "Invalid port for {}: {} (must be 1-65535)", name, value)
            }
            Self::InvalidPoolSize { value, minimum, maximum } => {
                write!(
                    f,
                    "Invalid pool size: {} (must be between {} and {})",
                    value, minimum, maximum
                )
            }
            Self::InvalidConnectionString { message } => {
                write!(f, "Invalid cache connection string: {}", message)
            }
            Self::NonPositiveValue { name } => {
                write!(f, "'{}' must be positive", name)
            }
            Self::ValueTooLarge { name, maximum } => {
                write!(f, "'{}' must not exceed {}", name, maximum)
            }
            Self::InvalidLogLevel { value } => {
                write!(
                    f,
                    "Invalid log level: '{}' (valid: trace, debug, info, warn, error)",
                    value
                )
            }
            Self::InvalidLogFormat { value } => {
                write!(f, "Invalid log format: '{}' (valid: pretty, json)", value)
            }
            Self::LockTimeoutTooShort {
                lock_timeout_ms,
                upstream_timeout_secs,
            } => {
                write!(
                    f,
                    "cache.lock_timeout_ms ({}) must be at least upstream.timeout_secs ({}s)",
                    lock_timeout_ms, upstream_timeout_secs
                )
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Maximum connection pool size.
    const MAX_POOL_SIZE: usize = 1000;

    /// Connection-string schemes the cache accessor can open.
    pub const SUPPORTED_SCHEMES: &'static [&'static str] = &["redis", "rediss", "memory"];

    /// Valid log levels.
    const VALID_LOG_LEVELS: &'static [&'static str] = &["trace", "debug", "info", "warn", "error"];

    /// Validates the entire application configuration.
    ///
    /// Returns Ok(()) if valid, or Err with all validation errors found.
    pub fn validate(config: &AppConfig) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();

        Self::validate_server(&config.server, &mut errors);
        Self::validate_cache(&config.cache, &mut errors);
        Self::validate_upstream(&config.upstream, &mut errors);
        Self::validate_observability(&config.observability, &mut errors);
        Self::validate_lock_timeout(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validates a backing-store connection string.
    pub fn validate_connection_string(value: &str) -> Result<(), ConfigValidationError> {
        if value.trim().is_empty() {
            return Err(ConfigValidationError::InvalidConnectionString {
                message: "connection string cannot be empty".to_string(),
            });
        }

        let url = Url::parse(value).map_err(|e| ConfigValidationError::InvalidConnectionString {
            message: format!("{}: {}", value, e),
        })?;

        if !Self::SUPPORTED_SCHEMES.contains(&url.scheme()) {
            return Err(ConfigValidationError::InvalidConnectionString {
                message: format!(
                    "unsupported scheme '{}' (expected one of {})",
                    url.scheme(),
                    Self::SUPPORTED_SCHEMES.join(", ")
                ),
            });
        }

        Ok(())
    }

    fn validate_server(config: &crate::ServerConfig, errors: &mut Vec<ConfigValidationError>) {
        if config.port == 0 {
            errors.push(ConfigValidationError::InvalidPort {
                name: "server.port".to_string(),
                value: config.port,
            });
        }

        if config.request_timeout_secs == 0 {
            errors.push(ConfigValidationError::NonPositiveValue {
                name: "server.request_timeout_secs".to_string(),
            });
        }
    }

    fn validate_cache(config: &crate::CacheConfig, errors: &mut Vec<ConfigValidationError>) {
        if let Err(e) = Self::validate_connection_string(&config.connection_string) {
            errors.push(e);
        }

        if config.pool_size == 0 || config.pool_size > Self::MAX_POOL_SIZE {
            errors.push(ConfigValidationError::InvalidPoolSize {
                value: config.pool_size,
                minimum: 1,
                maximum: Self::MAX_POOL_SIZE,
            });
        }

        for (name, value) in [
            ("cache.default_ttl_secs", config.default_ttl_secs),
            ("cache.connect_timeout_secs", config.connect_timeout_secs),
            ("cache.lock_timeout_ms", config.lock_timeout_ms),
        ] {
            if value == 0 {
                errors.push(ConfigValidationError::NonPositiveValue {
                    name: name.to_string(),
                });
            }
        }

        if config.default_ttl() > crate::CacheConfig::MAX_TTL {
            errors.push(ConfigValidationError::ValueTooLarge {
                name: "cache.default_ttl_secs".to_string(),
                maximum: crate::CacheConfig::MAX_TTL.as_secs(),
            });
        }

        if config.default_page_size == 0 {
            errors.push(ConfigValidationError::NonPositiveValue {
                name: "cache.default_page_size".to_string(),
            });
        }
    }

    fn validate_upstream(config: &crate::UpstreamConfig, errors: &mut Vec<ConfigValidationError>) {
        if config.timeout_secs == 0 {
            errors.push(ConfigValidationError::NonPositiveValue {
                name: "upstream.timeout_secs".to_string(),
            });
        }
    }

    fn validate_lock_timeout(config: &AppConfig, errors: &mut Vec<ConfigValidationError>) {
        let cache = &config.cache;
        if cache.per_key_locking
            && cache.lock_timeout_ms > 0
            && cache.lock_timeout() < config.upstream.timeout()
        {
            errors.push(ConfigValidationError::LockTimeoutTooShort {
                lock_timeout_ms: cache.lock_timeout_ms,
                upstream_timeout_secs: config.upstream.timeout_secs,
            });
        }
    }

    fn validate_observability(
        config: &crate::ObservabilityConfig,
        errors: &mut Vec<ConfigValidationError>,
    ) {
        let level = config.log_level.to_lowercase();
        if !Self::VALID_LOG_LEVELS.contains(&level.as_str()) {
            errors.push(ConfigValidationError::InvalidLogLevel {
                value: config.log_level.clone(),
            });
        }

        if config
            .log_format
            .parse::<cachegate_core::telemetry::LogFormat>()
            .is_err()
        {
            errors.push(ConfigValidationError::InvalidLogFormat {
                value: config.log_format.clone(),
            });
        }
    }
}
