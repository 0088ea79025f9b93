//! Storable snapshots of HTTP messages.
//!
//! A stored entry is one JSON document: status, reason, headers and a base64
//! payload. The two timing values ride in reserved headers so they survive
//! any store that only keeps opaque bytes.

mod headers;
pub mod media;
mod request;
mod response;

pub use headers::Headers;
pub use request::{HttpMethod, SerializedRequest};
pub use response::{SerializedResponse, DEFAULT_TTL, FORMAT_VERSION};

/// Reserved and well-known header names.
pub mod header_names {
    /// Content type projection.
    pub const CONTENT_TYPE: &str = "Content-Type";
    /// Content length, set on synthesized empty responses.
    pub const CONTENT_LENGTH: &str = "Content-Length";
    /// RFC 3339 instant at which the response was first stored.
    pub const CREATED_DATE_TIME: &str = "X-Created-DateTime";
    /// TTL the response was stored with, in (fractional) seconds.
    pub const ORIGINAL_EXPIRATION: &str = "X-Original-Expiration";

    /// Joins repeated values of a header that cannot be comma-folded, such
    /// as `Set-Cookie`. A line feed never occurs inside a valid value.
    pub const LINE_SEPARATOR: char = '\n';
}

/// Serde adapter writing byte payloads as standard base64 strings.
pub(crate) mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
