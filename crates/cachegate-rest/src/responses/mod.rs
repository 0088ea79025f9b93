//! API response types.

use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use cachegate_cache::{message::header_names::LINE_SEPARATOR, SerializedResponse};
use cachegate_core::{CacheError, ErrorResponse};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Standard API response wrapper for JSON endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorResponse>,
}

impl<T> ApiResponse<T> {
    /// Creates a successful response.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Creates an error response.
    pub fn error(error: ErrorResponse) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

/// Application error type for Axum.
#[derive(Debug)]
pub struct AppError(pub CacheError);

impl From<CacheError> for AppError {
    fn from(err: CacheError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!(code = self.0.error_code(), error = %self.0, "Request failed");
        }

        let body = Json(ApiResponse::<()>::error(ErrorResponse::from_error(&self.0)));
        (status, body).into_response()
    }
}

/// Result type for JSON handlers.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

/// Helper to create a success response.
pub fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

/// Headers that describe the stored hop or the stored framing, not the
/// response being sent now.
const SKIPPED_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "content-length",
];

/// Renders a [`SerializedResponse`] as the HTTP response.
///
/// Successful responses are sent byte for byte with their stored content
/// type. Failures keep their status and send the payload as text.
#[derive(Debug)]
pub struct CachedResponse(pub SerializedResponse);

impl CachedResponse {
    /// The synthesized `404 NotFound` response.
    #[must_use]
    pub fn not_found() -> Self {
        Self(SerializedResponse::not_found())
    }

    /// The synthesized `204` response.
    #[must_use]
    pub fn no_content() -> Self {
        Self(SerializedResponse::no_content())
    }
}

impl IntoResponse for CachedResponse {
    fn into_response(self) -> Response {
        let message = self.0;
        let status =
            StatusCode::from_u16(message.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut headers = HeaderMap::with_capacity(message.headers().len());
        for (name, value) in message.headers().iter() {
            if SKIPPED_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
                continue;
            }
            let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
                continue;
            };
            for value in value.split(LINE_SEPARATOR) {
                if let Ok(value) = HeaderValue::from_str(value) {
                    headers.append(name.clone(), value);
                }
            }
        }

        let body = if message.is_success() {
            Body::from(message.into_content())
        } else {
            Body::from(message.string_content().into_owned())
        };

        (status, headers, body).into_response()
    }
}
