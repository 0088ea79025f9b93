//! Application state for Axum handlers.

use cachegate_cache::CacheAccessor;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub accessor: Arc<dyn CacheAccessor>,
    /// Identity of the store every route operates on.
    pub connection_string: Arc<str>,
    /// Page size for key listings that do not request one.
    pub default_page_size: usize,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        accessor: Arc<dyn CacheAccessor>,
        connection_string: impl Into<Arc<str>>,
        default_page_size: usize,
    ) -> Self {
        Self {
            accessor,
            connection_string: connection_string.into(),
            default_page_size,
        }
    }
}
