//! Cache controller.
//!
//! Every route works against the store named by the configured connection
//! string.

use crate::{
    extractors::{
        forwarded_headers, CacheKeyQuery, ConstantQuery, KeysQuery, PaginationQuery, StoreQuery,
        UrlQuery,
    },
    responses::{ok, AppError, CachedResponse},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use cachegate_cache::{KeyExpirationTuple, SerializedRequest};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

/// Expiration instant of a key.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyExpirationResponse {
    pub key: String,
    pub expiration: DateTime<Utc>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(get_from_url)
                .put(store_request)
                .post(store_request)
                .delete(delete_key),
        )
        .route(
            "/const",
            get(get_constant).put(store_constant).post(store_constant),
        )
        .route("/keys", get(list_keys))
        .route("/key/:key/expiration", get(key_expiration))
        .route("/key/:key/ttl", get(key_ttl))
}

/// `GET /api/cache?cacheKey&cachedHttpUrl&expiration`
async fn get_from_url(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
    headers: HeaderMap,
) -> Result<CachedResponse, AppError> {
    debug!(key = %query.cache_key, url = %query.cached_http_url, "Get from URL request");

    let ttl = query.ttl()?;
    let mut request = SerializedRequest::get(query.cached_http_url);
    request.headers.extend(forwarded_headers(&headers));

    let response = state
        .accessor
        .get_or_fetch(&state.connection_string, &query.cache_key, request, ttl)
        .await?;
    Ok(CachedResponse(response))
}

/// `PUT|POST /api/cache?cacheKey&expiration` with a JSON request descriptor.
async fn store_request(
    State(state): State<AppState>,
    Query(query): Query<StoreQuery>,
    Json(request): Json<SerializedRequest>,
) -> Result<CachedResponse, AppError> {
    debug!(key = %query.cache_key, method = %request.method, uri = %request.uri, "Store request");

    let ttl = query.ttl()?;
    let response = state
        .accessor
        .get_or_fetch(&state.connection_string, &query.cache_key, request, ttl)
        .await?;
    Ok(CachedResponse(response))
}

/// `GET /api/cache/const?cacheKey&cachedValue&mimeType&expiration`
async fn get_constant(
    State(state): State<AppState>,
    Query(query): Query<ConstantQuery>,
) -> Result<CachedResponse, AppError> {
    debug!(key = %query.cache_key, "Get constant request");

    let ttl = query.ttl()?;
    let response = state
        .accessor
        .get_or_fetch_constant(
            &state.connection_string,
            &query.cache_key,
            &query.cached_value,
            query.mime_type.as_deref(),
            ttl,
        )
        .await?;
    Ok(CachedResponse(response))
}

/// `PUT|POST /api/cache/const?cacheKey&mimeType&expiration` with the value
/// as the request body. Without `mimeType` the request's content type is used.
async fn store_constant(
    State(state): State<AppState>,
    Query(query): Query<StoreQuery>,
    headers: HeaderMap,
    body: String,
) -> Result<CachedResponse, AppError> {
    debug!(key = %query.cache_key, bytes = body.len(), "Store constant request");

    let ttl = query.ttl()?;
    let mime_type = query.mime_type.as_deref().or_else(|| {
        headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    });

    let response = state
        .accessor
        .get_or_fetch_constant(
            &state.connection_string,
            &query.cache_key,
            &body,
            mime_type,
            ttl,
        )
        .await?;
    Ok(CachedResponse(response))
}

/// `DELETE /api/cache?cacheKey` answers 204 on removal, 404 otherwise.
async fn delete_key(
    State(state): State<AppState>,
    Query(query): Query<CacheKeyQuery>,
) -> Result<CachedResponse, AppError> {
    let removed = state
        .accessor
        .delete(&state.connection_string, &query.cache_key)
        .await?;

    Ok(if removed {
        CachedResponse::no_content()
    } else {
        CachedResponse::not_found()
    })
}

/// `GET /api/cache/keys?pattern&page&size`
async fn list_keys(
    State(state): State<AppState>,
    Query(keys): Query<KeysQuery>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Response, AppError> {
    let page = pagination.to_page_request(state.default_page_size);
    let pattern = keys.pattern.as_deref().unwrap_or_default();

    let pager = state
        .accessor
        .list_keys_page(&state.connection_string, pattern, page)
        .await?;

    if pager.is_not_found() {
        return Ok(CachedResponse::not_found().into_response());
    }
    Ok(ok(pager)?.into_response())
}

/// `GET /api/cache/key/{key}/expiration`
async fn key_expiration(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let expiration = state
        .accessor
        .key_expiration(&state.connection_string, &key)
        .await?;

    Ok(match expiration {
        Some(expiration) => ok(KeyExpirationResponse { key, expiration })?.into_response(),
        None => CachedResponse::not_found().into_response(),
    })
}

/// `GET /api/cache/key/{key}/ttl`
async fn key_ttl(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let tuple: Option<KeyExpirationTuple> = state
        .accessor
        .key_expiration_tuple(&state.connection_string, &key)
        .await?;

    Ok(match tuple {
        Some(tuple) => ok(tuple)?.into_response(),
        None => CachedResponse::not_found().into_response(),
    })
}
