//! Pagination extractor.

use cachegate_core::PageRequest;
use serde::Deserialize;

/// `?page=&size=`, 1-based.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationQuery {
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub size: Option<usize>,
}

impl PaginationQuery {
    /// Resolves missing values to page 1 and `default_size`.
    #[must_use]
    pub fn to_page_request(&self, default_size: usize) -> PageRequest {
        PageRequest::new(self.page.unwrap_or(1), self.size.unwrap_or(default_size))
    }
}

impl From<PaginationQuery> for PageRequest {
    fn from(query: PaginationQuery) -> Self {
        query.to_page_request(PageRequest::DEFAULT_SIZE)
    }
}
