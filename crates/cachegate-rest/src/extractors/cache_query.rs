//! Query strings of the cache routes.

use cachegate_config::CacheConfig;
use cachegate_core::{CacheError, CacheResult};
use serde::Deserialize;
use std::time::Duration;

/// `?cacheKey=`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheKeyQuery {
    pub cache_key: String,
}

/// `?cacheKey=&cachedHttpUrl=&expiration=`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlQuery {
    pub cache_key: String,
    pub cached_http_url: String,
    #[serde(default)]
    pub expiration: Option<String>,
}

/// `?cacheKey=&cachedValue=&mimeType=&expiration=`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstantQuery {
    pub cache_key: String,
    pub cached_value: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub expiration: Option<String>,
}

/// `?cacheKey=&mimeType=&expiration=` for routes that carry the value in
/// the request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreQuery {
    pub cache_key: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub expiration: Option<String>,
}

/// `?pattern=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeysQuery {
    #[serde(default)]
    pub pattern: Option<String>,
}

impl UrlQuery {
    pub fn ttl(&self) -> CacheResult<Option<Duration>> {
        parse_expiration(self.expiration.as_deref())
    }
}

impl ConstantQuery {
    pub fn ttl(&self) -> CacheResult<Option<Duration>> {
        parse_expiration(self.expiration.as_deref())
    }
}

impl StoreQuery {
    pub fn ttl(&self) -> CacheResult<Option<Duration>> {
        parse_expiration(self.expiration.as_deref())
    }
}

/// Parses an `expiration` value.
///
/// Accepts whole seconds (`600`) or a time span (`00:10:00`, `1.00:00:00`).
/// Missing or blank means "use the default TTL". Zero and values above
/// [`CacheConfig::MAX_TTL`] are rejected.
pub fn parse_expiration(value: Option<&str>) -> CacheResult<Option<Duration>> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    let seconds = if raw.contains(':') {
        parse_time_span(raw)
    } else {
        raw.parse::<u64>().ok()
    };

    match seconds {
        Some(0) => Err(CacheError::validation("expiration must be positive")),
        Some(seconds) if seconds > CacheConfig::MAX_TTL.as_secs() => {
            Err(CacheError::validation(format!(
                "expiration must not exceed {} seconds",
                CacheConfig::MAX_TTL.as_secs()
            )))
        }
        Some(seconds) => Ok(Some(Duration::from_secs(seconds))),
        None => Err(CacheError::validation(format!(
            "Invalid expiration '{}' (expected seconds or [d.]hh:mm:ss)",
            raw
        ))),
    }
}

fn parse_time_span(raw: &str) -> Option<u64> {
    let parts: Vec<&str> = raw.split(':').collect();
    let [hours, minutes, seconds] = parts.as_slice() else {
        return None;
    };

    let (days, hours) = match hours.split_once('.') {
        Some((days, hours)) => (days.parse::<u64>().ok()?, hours.parse::<u64>().ok()?),
        None => (0, hours.parse::<u64>().ok()?),
    };
    let minutes = minutes.parse::<u64>().ok()?;
    let seconds = seconds.parse::<u64>().ok()?;

    if minutes >= 60 || seconds >= 60 {
        return None;
    }

    days.checked_mul(86_400)?
        .checked_add(hours.checked_mul(3_600)?)?
        .checked_add(minutes * 60 + seconds)
}
