//! Key-expiration snapshots.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::time::Duration;

/// Read-only view of a key's remaining native TTL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyExpirationTuple {
    pub key: String,
    /// TTL the entry was stored with; `None` if the stored blob is unreadable.
    #[serde(serialize_with = "optional_seconds")]
    pub original_time_to_live: Option<Duration>,
    /// TTL the store reports right now.
    #[serde(serialize_with = "seconds")]
    pub current_time_to_live: Duration,
    /// `now + current_time_to_live`.
    pub expiration: DateTime<Utc>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn seconds<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_secs_f64())
}

#[allow(clippy::ref_option)]
fn optional_seconds<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(duration) => serializer.serialize_some(&duration.as_secs_f64()),
        None => serializer.serialize_none(),
    }
}
