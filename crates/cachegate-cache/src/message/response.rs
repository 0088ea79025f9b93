use super::header_names::{CONTENT_LENGTH, CONTENT_TYPE, CREATED_DATE_TIME, ORIGINAL_EXPIRATION};
use super::media::{self, OCTET_STREAM, TEXT_PLAIN};
use super::{base64_bytes, Headers};
use crate::fetcher::UpstreamResponse;
use cachegate_core::{CacheError, CacheResult};
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::Duration;

/// TTL stamped on a response when the caller supplies none.
pub const DEFAULT_TTL: Duration = Duration::from_secs(86_400);

/// Version of the stored JSON layout. Blobs without the field are version 1.
pub const FORMAT_VERSION: u32 = 1;

const fn default_format() -> u32 {
    FORMAT_VERSION
}

/// A cached HTTP response.
///
/// `created_date_time` and `original_expiration` live in the header map under
/// `X-Created-DateTime` and `X-Original-Expiration`; every other timing value
/// is derived from those two. Reading a stored response never re-stamps them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedResponse {
    #[serde(default = "default_format")]
    format: u32,
    status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason_phrase: Option<String>,
    #[serde(default)]
    headers: Headers,
    #[serde(default, with = "base64_bytes")]
    content: Vec<u8>,
}

impl SerializedResponse {
    /// Creates an empty response stamped with the current time and `ttl`.
    #[must_use]
    pub fn new(status_code: u16, ttl: Duration) -> Self {
        Self::stamped(status_code, Headers::new(), ttl, Utc::now())
    }

    fn stamped(status_code: u16, headers: Headers, ttl: Duration, now: DateTime<Utc>) -> Self {
        let mut response = Self {
            format: FORMAT_VERSION,
            status_code,
            reason_phrase: None,
            headers,
            content: Vec::new(),
        };
        if !response.headers.contains(CONTENT_TYPE) {
            response.set_content_type(OCTET_STREAM);
        }
        response.set_created_date_time(now);
        response.set_original_expiration(ttl);
        response
    }

    /// Snapshots a live upstream response.
    ///
    /// Upstream values for the two timing headers are overwritten.
    #[must_use]
    pub fn from_upstream(upstream: UpstreamResponse, ttl: Duration) -> Self {
        let headers: Headers = upstream.headers.into_iter().collect();
        let mut response = Self::stamped(upstream.status, headers, ttl, Utc::now());
        response.reason_phrase = upstream.reason;
        response.content = upstream.body;
        response
    }

    /// A `200 OK` whose payload is `value` encoded as UTF-8.
    #[must_use]
    pub fn constant(value: &str, mime_type: &str, ttl: Duration) -> Self {
        let mut response = Self::new(200, ttl);
        response.reason_phrase = Some("OK".to_string());
        response.set_content_type(mime_type);
        response.content = value.as_bytes().to_vec();
        response
    }

    /// `404` with a `NotFound` text body.
    #[must_use]
    pub fn not_found() -> Self {
        Self::plain(404, "Not Found", "NotFound")
    }

    /// `400` with a `BadRequest` text body.
    #[must_use]
    pub fn bad_request() -> Self {
        Self::plain(400, "Bad Request", "BadRequest")
    }

    /// `204` with an empty body and `Content-Length: 0`.
    #[must_use]
    pub fn no_content() -> Self {
        let mut response = Self::plain(204, "No Content", "");
        response.headers.insert(CONTENT_LENGTH, "0");
        response
    }

    fn plain(status_code: u16, reason: &str, body: &str) -> Self {
        let mut response = Self::new(status_code, DEFAULT_TTL);
        response.reason_phrase = Some(reason.to_string());
        response.set_content_type(TEXT_PLAIN);
        response.content = body.as_bytes().to_vec();
        response
    }

    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn set_status_code(&mut self, status_code: u16) {
        self.status_code = status_code;
    }

    #[must_use]
    pub fn reason_phrase(&self) -> Option<&str> {
        self.reason_phrase.as_deref()
    }

    pub fn set_reason_phrase(&mut self, reason: impl Into<String>) {
        self.reason_phrase = Some(reason.into());
    }

    /// True for status codes 200 through 299.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status_code >= 200 && self.status_code <= 299
    }

    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Returns the content type, or `application/octet-stream` if unset.
    #[must_use]
    pub fn content_type(&self) -> &str {
        self.headers.get(CONTENT_TYPE).unwrap_or(OCTET_STREAM)
    }

    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.headers.insert(CONTENT_TYPE, content_type);
    }

    /// Raw payload bytes.
    #[must_use]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn set_content(&mut self, content: impl Into<Vec<u8>>) {
        self.content = content.into();
    }

    /// Consumes the response, returning the payload.
    #[must_use]
    pub fn into_content(self) -> Vec<u8> {
        self.content
    }

    /// True if the content type classifies the payload as text.
    #[must_use]
    pub fn is_text(&self) -> bool {
        media::is_text(self.content_type())
    }

    /// The payload as a string, if it is text and valid UTF-8.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        if self.is_text() {
            std::str::from_utf8(&self.content).ok()
        } else {
            None
        }
    }

    /// The payload decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn string_content(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }

    /// The payload as a `data:` URI.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        media::to_data_uri(&self.content, self.content_type())
    }

    /// When the response was stored. Defaults to the Unix epoch.
    #[must_use]
    pub fn created_date_time(&self) -> DateTime<Utc> {
        parse_created(&self.headers)
            .ok()
            .flatten()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    pub fn set_created_date_time(&mut self, created: DateTime<Utc>) {
        self.headers.insert(
            CREATED_DATE_TIME,
            created.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        );
    }

    /// TTL the response was stored with. Defaults to zero.
    #[must_use]
    pub fn original_expiration(&self) -> Duration {
        parse_original_expiration(&self.headers)
            .ok()
            .flatten()
            .unwrap_or(Duration::ZERO)
    }

    pub fn set_original_expiration(&mut self, ttl: Duration) {
        self.headers
            .insert(ORIGINAL_EXPIRATION, ttl.as_secs_f64().to_string());
    }

    /// `created_date_time + original_expiration`.
    #[must_use]
    pub fn expiration_date_time(&self) -> DateTime<Utc> {
        let created = self.created_date_time();
        TimeDelta::from_std(self.original_expiration())
            .ok()
            .and_then(|delta| created.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Moves the expiration by rewriting `original_expiration` relative to
    /// the creation stamp. Instants before creation store a zero TTL.
    pub fn set_expiration_date_time(&mut self, expiration: DateTime<Utc>) {
        let ttl = (expiration - self.created_date_time())
            .to_std()
            .unwrap_or(Duration::ZERO);
        self.set_original_expiration(ttl);
    }

    /// Time left until `expiration_date_time`, zero once it has passed.
    #[must_use]
    pub fn time_to_live(&self) -> Duration {
        self.time_to_live_at(Utc::now())
    }

    /// [`time_to_live`](Self::time_to_live) as observed at `now`.
    #[must_use]
    pub fn time_to_live_at(&self, now: DateTime<Utc>) -> Duration {
        (self.expiration_date_time() - now)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Serializes the response to its stored form.
    pub fn encode(&self) -> CacheResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parses a stored response.
    ///
    /// Fails with `Serialization` if the blob is not a response, comes from a
    /// newer layout, or carries unreadable timing headers.
    pub fn decode(bytes: &[u8]) -> CacheResult<Self> {
        let response: Self = serde_json::from_slice(bytes)?;

        if response.format > FORMAT_VERSION {
            return Err(CacheError::serialization(format!(
                "Unsupported stored response format {} (newest known is {})",
                response.format, FORMAT_VERSION
            )));
        }

        parse_created(&response.headers)?;
        parse_original_expiration(&response.headers)?;

        Ok(response)
    }
}

fn parse_created(headers: &Headers) -> CacheResult<Option<DateTime<Utc>>> {
    headers
        .get(CREATED_DATE_TIME)
        .map(|value| {
            DateTime::parse_from_rfc3339(value.trim())
                .map(|parsed| parsed.with_timezone(&Utc))
                .map_err(|e| {
                    CacheError::serialization(format!(
                        "Invalid {} header '{}': {}",
                        CREATED_DATE_TIME, value, e
                    ))
                })
        })
        .transpose()
}

fn parse_original_expiration(headers: &Headers) -> CacheResult<Option<Duration>> {
    headers
        .get(ORIGINAL_EXPIRATION)
        .map(|value| {
            value
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                .ok_or_else(|| {
                    CacheError::serialization(format!(
                        "Invalid {} header '{}'",
                        ORIGINAL_EXPIRATION, value
                    ))
                })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream(status: u16, content_type: Option<&str>, body: &[u8]) -> UpstreamResponse {
        let mut headers = vec![("ETag".to_string(), "\"v1\"".to_string())];
        if let Some(content_type) = content_type {
            headers.push(("content-type".to_string(), content_type.to_string()));
        }
        UpstreamResponse {
            status,
            reason: Some("Whatever".to_string()),
            headers,
            body: body.to_vec(),
        }
    }

    #[test]
    fn test_is_success_bounds() {
        let mut response = SerializedResponse::new(199, DEFAULT_TTL);
        assert!(!response.is_success());
        for status in [200, 250, 299] {
            response.set_status_code(status);
            assert!(response.is_success());
        }
        response.set_status_code(300);
        assert!(!response.is_success());
    }

    #[test]
    fn test_new_stamps_timing_headers() {
        let before = Utc::now();
        let response = SerializedResponse::new(200, Duration::from_secs(10));

        assert!(response.headers().contains("x-created-datetime"));
        assert_eq!(response.original_expiration(), Duration::from_secs(10));
        assert!(response.created_date_time() >= before - TimeDelta::seconds(1));
        assert!(response.time_to_live() <= Duration::from_secs(10));
    }

    #[test]
    fn test_timing_defaults_when_headers_absent() {
        let response = SerializedResponse::decode(br#"{"statusCode":200}"#).unwrap();

        assert_eq!(response.created_date_time(), DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(response.original_expiration(), Duration::ZERO);
        assert_eq!(response.expiration_date_time(), DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(response.content_type(), OCTET_STREAM);
    }

    #[test]
    fn test_time_to_live_counts_from_original_stamp() {
        let mut response = SerializedResponse::constant("v", TEXT_PLAIN, Duration::from_secs(10));
        let created = Utc::now() - TimeDelta::seconds(5);
        response.set_created_date_time(created);

        let decoded = SerializedResponse::decode(&response.encode().unwrap()).unwrap();
        let ttl = decoded.time_to_live_at(created + TimeDelta::seconds(5));

        assert_eq!(ttl, Duration::from_secs(5));
        assert_eq!(decoded.created_date_time(), response.created_date_time());
    }

    #[test]
    fn test_time_to_live_clamps_at_zero() {
        let mut response = SerializedResponse::new(200, Duration::from_secs(10));
        let created = Utc::now() - TimeDelta::hours(1);
        response.set_created_date_time(created);

        assert_eq!(response.time_to_live(), Duration::ZERO);
    }

    #[test]
    fn test_set_expiration_date_time_rewrites_original_expiration() {
        let mut response = SerializedResponse::new(200, DEFAULT_TTL);
        let created = response.created_date_time();

        response.set_expiration_date_time(created + TimeDelta::seconds(90));
        assert_eq!(response.original_expiration(), Duration::from_secs(90));

        response.set_expiration_date_time(created - TimeDelta::seconds(90));
        assert_eq!(response.original_expiration(), Duration::ZERO);
    }

    #[test]
    fn test_fractional_expiration_round_trips() {
        let mut response = SerializedResponse::new(200, Duration::from_millis(1500));
        response.set_content(vec![1, 2, 3]);

        let decoded = SerializedResponse::decode(&response.encode().unwrap()).unwrap();
        assert_eq!(decoded.original_expiration(), Duration::from_millis(1500));
    }

    #[test]
    fn test_round_trip_preserves_everything() {
        let mut response =
            SerializedResponse::from_upstream(upstream(503, Some("image/png"), &[0, 255, 7]), DEFAULT_TTL);
        response.headers_mut().insert("X-Mixed-Case", "yes");

        let decoded = SerializedResponse::decode(&response.encode().unwrap()).unwrap();

        assert_eq!(decoded, response);
        assert_eq!(decoded.status_code(), 503);
        assert_eq!(decoded.reason_phrase(), Some("Whatever"));
        assert_eq!(decoded.content(), &[0, 255, 7]);
        assert_eq!(decoded.headers().get("x-mixed-case"), Some("yes"));
        assert_eq!(decoded.headers().get("etag"), Some("\"v1\""));
    }

    #[test]
    fn test_from_upstream_defaults_content_type() {
        let response = SerializedResponse::from_upstream(upstream(200, None, b"raw"), DEFAULT_TTL);
        assert_eq!(response.content_type(), OCTET_STREAM);
        assert!(response.text().is_none());
    }

    #[test]
    fn test_from_upstream_overwrites_timing_headers() {
        let mut source = upstream(200, Some("text/plain"), b"x");
        source
            .headers
            .push((CREATED_DATE_TIME.to_string(), "not a date".to_string()));

        let response = SerializedResponse::from_upstream(source, Duration::from_secs(60));
        assert!(SerializedResponse::decode(&response.encode().unwrap()).is_ok());
        assert_eq!(response.original_expiration(), Duration::from_secs(60));
    }

    #[test]
    fn test_decode_rejects_malformed_timing_headers() {
        let bad_created =
            br#"{"statusCode":200,"headers":{"X-Created-DateTime":"yesterday"}}"#;
        assert!(matches!(
            SerializedResponse::decode(bad_created),
            Err(CacheError::Serialization(_))
        ));

        let bad_expiration =
            br#"{"statusCode":200,"headers":{"X-Original-Expiration":"-5"}}"#;
        assert!(matches!(
            SerializedResponse::decode(bad_expiration),
            Err(CacheError::Serialization(_))
        ));
    }

    #[test]
    fn test_decode_rejects_newer_format_and_garbage() {
        assert!(matches!(
            SerializedResponse::decode(br#"{"format":99,"statusCode":200}"#),
            Err(CacheError::Serialization(_))
        ));
        assert!(matches!(
            SerializedResponse::decode(b"\x00\x01not json"),
            Err(CacheError::Serialization(_))
        ));
    }

    #[test]
    fn test_synthesized_responses() {
        let not_found = SerializedResponse::not_found();
        assert_eq!(not_found.status_code(), 404);
        assert_eq!(not_found.text(), Some("NotFound"));
        assert_eq!(not_found.content_type(), TEXT_PLAIN);

        let no_content = SerializedResponse::no_content();
        assert_eq!(no_content.status_code(), 204);
        assert!(no_content.content().is_empty());
        assert_eq!(no_content.headers().get("content-length"), Some("0"));

        let bad_request = SerializedResponse::bad_request();
        assert_eq!(bad_request.status_code(), 400);
        assert!(!bad_request.is_success());
    }

    #[test]
    fn test_constant_response() {
        let response = SerializedResponse::constant("{\"a\":1}", "application/json", DEFAULT_TTL);
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.reason_phrase(), Some("OK"));
        assert_eq!(response.text(), Some("{\"a\":1}"));
        assert_eq!(
            response.to_data_uri(),
            "data:application/json;base64,eyJhIjoxfQ=="
        );
    }
}
