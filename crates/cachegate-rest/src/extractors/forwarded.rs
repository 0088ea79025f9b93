use axum::http::HeaderMap;

/// Inbound headers with this prefix are replayed upstream without it.
pub const FORWARD_PREFIX: &str = "x-forward-";

/// Collects `X-Forward-<Name>` headers as `(<name>, value)` pairs.
///
/// Values that are not visible ASCII are dropped.
pub fn forwarded_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            let stripped = name.as_str().strip_prefix(FORWARD_PREFIX)?;
            if stripped.is_empty() {
                return None;
            }
            Some((stripped.to_string(), value.to_str().ok()?.to_string()))
        })
        .collect()
}
