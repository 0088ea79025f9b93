//! Pagination types for key listings.

use serde::{Deserialize, Serialize};

/// A request for a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// The page number (1-based).
    pub page: usize,
    /// The number of items per page.
    pub size: usize,
}

impl PageRequest {
    /// The default page size.
    pub const DEFAULT_SIZE: usize = 50;
    /// The maximum allowed page size.
    pub const MAX_SIZE: usize = 1000;

    /// Creates a new page request.
    ///
    /// Page `0` is treated as the first page and the size is clamped to
    /// `1..=MAX_SIZE`.
    #[must_use]
    pub fn new(page: usize, size: usize) -> Self {
        Self {
            page: page.max(1),
            size: size.clamp(1, Self::MAX_SIZE),
        }
    }

    /// Creates a page request for the first page with default size.
    #[must_use]
    pub fn first() -> Self {
        Self::new(1, Self::DEFAULT_SIZE)
    }

    /// Returns the number of items preceding this page.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.size)
    }

    /// Returns the maximum number of items on this page.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

/// A window over a finite result sequence.
///
/// An empty source produces [`Pager::not_found`], which is distinct from a
/// valid page past the end of a non-empty source: the latter has
/// `found == true` and no content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pager<T> {
    /// The items on this page.
    pub content: Vec<T>,
    /// The current page number (1-based).
    pub page_number: usize,
    /// The number of items per page.
    pub page_size: usize,
    /// The total number of items across all pages.
    pub total_count: usize,
    /// Whether the source sequence had any items at all.
    pub found: bool,
}

impl<T> Pager<T> {
    /// Creates a page from content that has already been windowed.
    #[must_use]
    pub fn new(content: Vec<T>, page_number: usize, page_size: usize, total_count: usize) -> Self {
        Self {
            content,
            page_number,
            page_size,
            total_count,
            found: true,
        }
    }

    /// Creates the distinguished "no matches at all" result.
    #[must_use]
    pub fn not_found(request: PageRequest) -> Self {
        Self {
            content: Vec::new(),
            page_number: request.page,
            page_size: request.size,
            total_count: 0,
            found: false,
        }
    }

    /// Windows a complete sequence according to `request`.
    #[must_use]
    pub fn from_items(items: Vec<T>, request: PageRequest) -> Self {
        if items.is_empty() {
            return Self::not_found(request);
        }

        let total_count = items.len();
        let content = items
            .into_iter()
            .skip(request.offset())
            .take(request.limit())
            .collect();

        Self::new(content, request.page, request.size, total_count)
    }

    /// Returns true if the source sequence had no items.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        !self.found
    }

    /// Returns true if this page holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Returns the number of items on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Returns the total number of pages.
    #[must_use]
    pub const fn total_pages(&self) -> usize {
        if self.page_size == 0 {
            0
        } else {
            self.total_count.div_ceil(self.page_size)
        }
    }

    /// Returns true if there is a next page.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page_number < self.total_pages()
    }

    /// Returns true if there is a previous page.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page_number > 1
    }

    /// Maps the page content to a different type.
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Pager<U> {
        Pager {
            content: self.content.into_iter().map(f).collect(),
            page_number: self.page_number,
            page_size: self.page_size,
            total_count: self.total_count,
            found: self.found,
        }
    }
}

impl<T> IntoIterator for Pager<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.content.into_iter()
    }
}
