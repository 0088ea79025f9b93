use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Header map with case-insensitive lookup.
///
/// Names keep the case they were first inserted with; inserting a name that
/// differs only in case replaces the value and keeps the stored spelling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct Headers {
    // lowercased name -> (stored name, value)
    entries: BTreeMap<String, (String, String)>,
}

impl Headers {
    /// Creates an empty header map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `name`, ignoring case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(|(_, value)| value.as_str())
    }

    /// Returns true if a value is stored under `name`, ignoring case.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    /// Stores `value` under `name`, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        let folded = name.to_ascii_lowercase();

        if let Some((_, existing)) = self.entries.get_mut(&folded) {
            return Some(std::mem::replace(existing, value));
        }

        self.entries.insert(folded, (name, value));
        None
    }

    /// Removes `name`, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries
            .remove(&name.to_ascii_lowercase())
            .map(|(_, value)| value)
    }

    /// Iterates `(stored name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        headers.extend(iter);
        headers
    }
}

impl<N: Into<String>, V: Into<String>> Extend<(N, V)> for Headers {
    fn extend<I: IntoIterator<Item = (N, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

impl From<BTreeMap<String, String>> for Headers {
    fn from(map: BTreeMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl From<Headers> for BTreeMap<String, String> {
    fn from(headers: Headers) -> Self {
        headers.entries.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_ignores_case() {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "text/plain");

        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/plain"));
        assert!(headers.contains("Content-type"));
    }

    #[test]
    fn test_insert_keeps_first_spelling() {
        let mut headers = Headers::new();
        headers.insert("X-Trace", "1");
        let previous = headers.insert("x-trace", "2");

        assert_eq!(previous.as_deref(), Some("1"));
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.iter().next(), Some(("X-Trace", "2")));
    }

    #[test]
    fn test_remove() {
        let mut headers: Headers = [("Accept", "*/*")].into_iter().collect();
        assert_eq!(headers.remove("ACCEPT").as_deref(), Some("*/*"));
        assert!(headers.is_empty());
    }

    #[test]
    fn test_json_preserves_stored_case() {
        let headers: Headers = [("X-Custom-Header", "v"), ("etag", "\"abc\"")]
            .into_iter()
            .collect();

        let json = serde_json::to_string(&headers).unwrap();
        assert!(json.contains("X-Custom-Header"));
        assert!(json.contains("etag"));

        let back: Headers = serde_json::from_str(&json).unwrap();
        assert_eq!(back, headers);
        assert_eq!(back.get("x-custom-header"), Some("v"));
    }
}
