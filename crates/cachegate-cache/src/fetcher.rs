//! Outbound HTTP used on a cache miss.

use crate::message::{header_names::LINE_SEPARATOR, SerializedRequest};
use async_trait::async_trait;
use cachegate_config::UpstreamConfig;
use cachegate_core::{CacheError, CacheResult};
use cachegate_resilience::with_timeout;
use std::time::Duration;
use tracing::{debug, info};

/// A response read in full from an upstream server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub reason: Option<String>,
    /// One entry per header name. Repeated values are joined with `", "`,
    /// except `Set-Cookie` whose values are joined with a line feed.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Performs the outbound call described by a [`SerializedRequest`].
///
/// Implementations return `UpstreamFetch` or `Timeout` when no response could
/// be obtained. A non-2xx upstream status is a response, not an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &SerializedRequest) -> CacheResult<UpstreamResponse>;
}

/// [`Fetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestFetcher {
    /// Builds a client from the upstream settings.
    pub fn new(config: &UpstreamConfig) -> CacheResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.timeout())
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| CacheError::internal(format!("Failed to build HTTP client: {}", e)))?;

        info!(
            timeout_secs = config.timeout_secs,
            "Upstream HTTP client initialized"
        );

        Ok(Self::with_client(client, config.timeout()))
    }

    /// Wraps an existing client; each fetch is bounded by `timeout`.
    #[must_use]
    pub const fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, request: &SerializedRequest) -> CacheResult<UpstreamResponse> {
        let uri = request.uri.as_str();
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| CacheError::upstream(uri, e.to_string()))?;

        let mut builder = self.client.request(method, uri);
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        if !request.content.is_empty() {
            builder = builder.body(request.content.clone());
        }

        debug!(event = "SENDING_REQUEST", method = %request.method, uri = %uri, "Fetching upstream");

        with_timeout(self.timeout, || async move {
            let response = builder
                .send()
                .await
                .map_err(|e| CacheError::upstream(uri, e.to_string()))?;

            let status = response.status();
            let mut headers = Vec::with_capacity(response.headers().keys_len());
            for name in response.headers().keys() {
                let values: Vec<&str> = response
                    .headers()
                    .get_all(name)
                    .iter()
                    .filter_map(|value| value.to_str().ok())
                    .collect();
                if values.is_empty() {
                    continue;
                }
                let joined = if *name == reqwest::header::SET_COOKIE {
                    values.join(&LINE_SEPARATOR.to_string())
                } else {
                    values.join(", ")
                };
                headers.push((name.as_str().to_string(), joined));
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| CacheError::upstream(uri, e.to_string()))?;

            Ok(UpstreamResponse {
                status: status.as_u16(),
                reason: status.canonical_reason().map(str::to_string),
                headers,
                body: body.to_vec(),
            })
        })
        .await
    }
}
