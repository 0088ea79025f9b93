//! Application builder.

use axum::Router;
use cachegate_cache::{
    AccessorSettings, CacheAccessor, CacheAccessorImpl, ConnectionRegistry, DefaultConnector,
    ReqwestFetcher,
};
use cachegate_config::AppConfig;
use cachegate_core::{CacheError, CacheResult};
use cachegate_rest::{create_router, AppState};
use std::{future::Future, sync::Arc};
use tracing::{info, warn};

/// Application builder for constructing the server.
pub struct AppBuilder {
    config: Option<AppConfig>,
}

impl AppBuilder {
    /// Creates a new application builder.
    pub fn new() -> Self {
        Self { config: None }
    }

    /// Sets the configuration.
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Wires the registry, fetcher and accessor into the router.
    pub fn build(self) -> CacheResult<App> {
        let config = self.config.unwrap_or_default();

        let registry = Arc::new(ConnectionRegistry::new(Arc::new(
            DefaultConnector::from_config(&config.cache),
        )));
        let fetcher = Arc::new(ReqwestFetcher::new(&config.upstream)?);
        let accessor: Arc<dyn CacheAccessor> = Arc::new(CacheAccessorImpl::new(
            registry,
            fetcher,
            AccessorSettings::from_config(&config.cache),
        ));

        let state = AppState::new(
            Arc::clone(&accessor),
            config.cache.connection_string.as_str(),
            config.cache.default_page_size,
        );
        let router = create_router(state, &config.server);

        Ok(App {
            config,
            accessor,
            router,
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A wired application, ready to serve.
pub struct App {
    config: AppConfig,
    accessor: Arc<dyn CacheAccessor>,
    router: Router,
}

impl App {
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Connects to the configured store ahead of the first request.
    ///
    /// A failure is logged only; `/ready` keeps reporting it and the
    /// registry retries on the next use.
    pub async fn warm_up(&self) {
        let identity = &self.config.cache.connection_string;
        match self.accessor.ping(identity).await {
            Ok(()) => info!("Store connection established"),
            Err(e) => warn!(error = %e, "Store is not reachable yet"),
        }
    }

    /// Binds the configured address and serves until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> CacheResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.server.addr();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| CacheError::Internal(format!("Failed to bind {}: {}", addr, e)))?;

        info!("Starting REST server on http://{}", addr);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| CacheError::Internal(format!("REST server error: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    fn memory_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.cache.connection_string = "memory://app-tests".to_string();
        config
    }

    #[test]
    fn test_app_builder_new() {
        let builder = AppBuilder::new();
        assert!(builder.config.is_none());
    }

    #[test]
    fn test_app_builder_with_config() {
        let builder = AppBuilder::new().with_config(memory_config());
        assert!(builder.config.is_some());
    }

    #[tokio::test]
    async fn test_build_defaults_to_redis_store() {
        let app = AppBuilder::default().build().unwrap();
        assert!(app.config().cache.connection_string.starts_with("redis://"));
    }

    #[tokio::test]
    async fn test_built_router_serves_cache_routes() {
        let app = AppBuilder::new().with_config(memory_config()).build().unwrap();
        app.warm_up().await;

        let response = app
            .router()
            .oneshot(
                Request::get("/api/cache/const?cacheKey=k&cachedValue=v")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let ready = app
            .router()
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(ready.status(), StatusCode::OK);
    }
}
