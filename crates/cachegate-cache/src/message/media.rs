//! Content-type classification and data URIs.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Fallback content type for payloads that do not declare one.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Content type of synthesized and constant-value responses.
pub const TEXT_PLAIN: &str = "text/plain";

/// Non-`text/*` types whose payloads are still text.
const TEXTUAL_APPLICATION_TYPES: &[&str] = &[
    "application/json",
    "application/xml",
    "application/javascript",
    "application/ecmascript",
    "application/x-www-form-urlencoded",
    "application/x-javascript",
    "application/graphql",
    "application/yaml",
    "application/x-yaml",
    "application/toml",
    "application/sql",
    "image/svg+xml",
];

/// Returns the media type without parameters, lowercased.
///
/// `"Text/HTML; charset=utf-8"` becomes `"text/html"`.
#[must_use]
pub fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Returns true if payloads of this content type are text.
#[must_use]
pub fn is_text(content_type: &str) -> bool {
    let essence = essence(content_type);
    essence.starts_with("text/")
        || essence.ends_with("+json")
        || essence.ends_with("+xml")
        || TEXTUAL_APPLICATION_TYPES.contains(&essence.as_str())
}

/// Encodes `data` as a `data:` URI.
#[must_use]
pub fn to_data_uri(data: &[u8], mime_type: &str) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_classification() {
        assert!(is_text("text/plain"));
        assert!(is_text("text/html; charset=utf-8"));
        assert!(is_text("Application/JSON"));
        assert!(is_text("application/problem+json"));
        assert!(is_text("application/atom+xml"));

        assert!(!is_text(OCTET_STREAM));
        assert!(!is_text("image/png"));
        assert!(!is_text(""));
    }

    #[test]
    fn test_essence_strips_parameters() {
        assert_eq!(essence(" Text/HTML ; charset=utf-8"), "text/html");
    }

    #[test]
    fn test_data_uri() {
        assert_eq!(to_data_uri(b"hello", TEXT_PLAIN), "data:text/plain;base64,aGVsbG8=");
        assert_eq!(to_data_uri(&[], OCTET_STREAM), "data:application/octet-stream;base64,");
    }
}
