use super::header_names::CONTENT_TYPE;
use super::media::OCTET_STREAM;
use super::{base64_bytes, Headers};
use cachegate_core::{CacheError, CacheResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// HTTP method of an outbound request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Trace,
}

impl HttpMethod {
    /// Returns the method token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "OPTIONS" => Ok(Self::Options),
            "TRACE" => Ok(Self::Trace),
            other => Err(CacheError::validation(format!("Unsupported HTTP method: {}", other))),
        }
    }
}

/// An outbound HTTP call to replay on a cache miss.
///
/// The content type is not a field of its own; it is read from and written
/// to the `Content-Type` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedRequest {
    pub uri: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default, with = "base64_bytes")]
    pub content: Vec<u8>,
}

impl SerializedRequest {
    /// Creates a request with no headers and an empty body.
    pub fn new(method: HttpMethod, uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            method,
            headers: Headers::new(),
            content: Vec::new(),
        }
    }

    /// Creates a plain `GET` for `uri`.
    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, uri)
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets the body and its content type.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<Vec<u8>>, content_type: &str) -> Self {
        self.content = content.into();
        self.set_content_type(content_type);
        self
    }

    /// Returns the content type, or `application/octet-stream` if unset.
    #[must_use]
    pub fn content_type(&self) -> &str {
        self.headers.get(CONTENT_TYPE).unwrap_or(OCTET_STREAM)
    }

    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.headers.insert(CONTENT_TYPE, content_type);
    }

    /// Serializes the request to its JSON wire form.
    pub fn encode(&self) -> CacheResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parses a request from its JSON wire form.
    pub fn decode(bytes: &[u8]) -> CacheResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parsing() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("Delete".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
        assert!(matches!(
            "BREW".parse::<HttpMethod>(),
            Err(CacheError::Validation(_))
        ));
    }

    #[test]
    fn test_method_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&HttpMethod::Patch).unwrap(), "\"PATCH\"");
    }

    #[test]
    fn test_content_type_is_a_header_projection() {
        let mut request = SerializedRequest::get("http://example.test/");
        assert_eq!(request.content_type(), OCTET_STREAM);

        request.set_content_type("application/json");
        assert_eq!(request.headers.get("content-type"), Some("application/json"));

        request.headers.insert("CONTENT-TYPE", "text/csv");
        assert_eq!(request.content_type(), "text/csv");
        assert_eq!(request.headers.len(), 1);
    }

    #[test]
    fn test_round_trip_with_binary_body() {
        let request = SerializedRequest::new(HttpMethod::Post, "http://example.test/upload")
            .with_header("Authorization", "Bearer t")
            .with_content(vec![0u8, 159, 146, 150, 255], OCTET_STREAM);

        let decoded = SerializedRequest::decode(&request.encode().unwrap()).unwrap();
        assert_eq!(decoded, request);
        assert_eq!(decoded.headers.get("authorization"), Some("Bearer t"));
    }

    #[test]
    fn test_decode_minimal_json() {
        let request = SerializedRequest::decode(br#"{"uri":"http://example.test/"}"#).unwrap();
        assert_eq!(request.method, HttpMethod::Get);
        assert!(request.headers.is_empty());
        assert!(request.content.is_empty());
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        let err = SerializedRequest::decode(br#"{"uri":"u","content":"***"}"#).unwrap_err();
        assert!(matches!(err, CacheError::Serialization(_)));
    }
}
