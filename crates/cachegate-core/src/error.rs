//! Unified error types for the cache accessor and its boundary.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;

/// Unified error type for Cachegate.
///
/// Connection and serialization failures are hard failures that the boundary
/// layer renders as 5xx. Upstream fetch failures are normally absorbed by the
/// accessor and turned into a synthesized not-found response, so they only
/// surface here when a caller asks for them explicitly.
#[derive(Error, Debug)]
pub enum CacheError {
    // ============ Store Errors ============
    /// The backing store is unreachable or a handle could not be established.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Stored or in-flight bytes do not have the expected shape.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The backing store rejected a command.
    #[error("Store error: {0}")]
    Store(String),

    // ============ Upstream Errors ============
    /// The miss-path fetch failed.
    #[error("Upstream fetch failed: {uri} - {message}")]
    UpstreamFetch { uri: String, message: String },

    /// Timeout error
    #[error("Operation timed out: {0}")]
    Timeout(String),

    // ============ Request Errors ============
    /// Resource not found
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    // ============ Internal Errors ============
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CacheError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Validation(_) => 400,
            Self::UpstreamFetch { .. } => 502,
            Self::Connection(_) | Self::Timeout(_) => 503,
            Self::Serialization(_)
            | Self::Store(_)
            | Self::Configuration(_)
            | Self::Internal(_)
            | Self::Other(_) => 500,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Connection(_) => "CONNECTION_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Store(_) => "STORE_ERROR",
            Self::UpstreamFetch { .. } => "UPSTREAM_FETCH_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Creates a not found error for a resource.
    #[must_use]
    pub fn not_found<T: ToString>(resource_type: &'static str, id: T) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection<T: Into<String>>(message: T) -> Self {
        Self::Connection(message.into())
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization<T: Into<String>>(message: T) -> Self {
        Self::Serialization(message.into())
    }

    /// Creates an upstream fetch error.
    #[must_use]
    pub fn upstream<U: Into<String>, M: Into<String>>(uri: U, message: M) -> Self {
        Self::UpstreamFetch {
            uri: uri.into(),
            message: message.into(),
        }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }

    /// Checks if the caller may retry the whole operation.
    ///
    /// The core never retries on its own.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Store(_) | Self::UpstreamFetch { .. } | Self::Timeout(_)
        )
    }

    /// Checks if this error is absorbed by the accessor instead of propagated.
    #[must_use]
    pub const fn is_downgradable(&self) -> bool {
        matches!(self, Self::UpstreamFetch { .. } | Self::Timeout(_))
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(format!("JSON serialization error: {}", err))
    }
}

/// Serializable error response for API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Request trace ID for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

impl ErrorResponse {
    /// Creates a new error response from a `CacheError`.
    #[must_use]
    pub fn from_error(error: &CacheError) -> Self {
        Self {
            code: error.error_code().to_string(),
            message: error.to_string(),
            trace_id: None,
        }
    }

    /// Sets the trace ID.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }
}

impl From<&CacheError> for ErrorResponse {
    fn from(error: &CacheError) -> Self {
        Self::from_error(error)
    }
}
