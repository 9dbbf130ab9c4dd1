//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the redirect, add and list handlers
//! - Wire up middleware (tracing, request ID, timeout, limits, headers)
//! - Serve plain TCP or TLS with graceful shutdown
//! - Apply hot-reloaded mapping sets to the store
//! - Optionally persist the mapping table on shutdown

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{MappingUpdate, RedirectConfig};
use crate::http::handlers::{add_mapping, healthz, list_mappings, method_not_allowed, redirect};
use crate::http::middleware::track_metrics;
use crate::observability::metrics;
use crate::security::{headers, limits};
use crate::store::{save_mappings, BootstrapSource, PathStore};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: PathStore,
    pub strict_validation: bool,
}

/// HTTP server for the redirect service.
pub struct HttpServer {
    router: Router,
    config: RedirectConfig,
    store: PathStore,
    bootstrap_source: BootstrapSource,
}

impl HttpServer {
    /// Create a new HTTP server serving `store`.
    pub fn new(config: RedirectConfig, store: PathStore) -> Self {
        let state = AppState {
            store: store.clone(),
            strict_validation: config.security.strict_validation,
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            store,
            bootstrap_source: BootstrapSource::File,
        }
    }

    /// Record how the store was populated at startup.
    ///
    /// A store built after an unreadable mapping file is never persisted
    /// over that file.
    pub fn with_bootstrap_source(mut self, source: BootstrapSource) -> Self {
        self.bootstrap_source = source;
        self
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// `/add`, `/mappings` and `/healthz` take precedence over the
    /// catch-all redirect fallback.
    #[allow(deprecated)]
    pub fn build_router(config: &RedirectConfig, state: AppState) -> Router {
        let router = Router::new()
            .route("/add", post(add_mapping).fallback(method_not_allowed))
            .route("/mappings", get(list_mappings).fallback(method_not_allowed))
            .route("/healthz", get(healthz).fallback(method_not_allowed))
            .fallback(redirect)
            .with_state(state)
            .layer(middleware::from_fn(track_metrics))
            .layer(limits::body_limit_layer(&config.security))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        let router = if config.security.enable_headers {
            router
                .layer(headers::nosniff_layer())
                .layer(headers::referrer_policy_layer())
        } else {
            router
        };

        router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        updates: mpsc::UnboundedReceiver<MappingUpdate>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, mappings = self.store.len(), "HTTP server starting");

        let reloader = spawn_reloader(self.store.clone(), updates);

        axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        reloader.abort();
        self.finish();
        Ok(())
    }

    /// Run the server over TLS on `addr` until `shutdown` fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        updates: mpsc::UnboundedReceiver<MappingUpdate>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, mappings = self.store.len(), "HTTPS server starting");

        let reloader = spawn_reloader(self.store.clone(), updates);

        let handle = axum_server::Handle::new();
        let shutdown_handle = handle.clone();
        let grace = Duration::from_secs(self.config.timeouts.request_secs);
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            shutdown_handle.graceful_shutdown(Some(grace));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.clone().into_make_service())
            .await?;

        reloader.abort();
        self.finish();
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RedirectConfig {
        &self.config
    }

    fn finish(&self) {
        if self.config.mappings.persist_on_shutdown {
            if let Some(path) = &self.config.mappings.file {
                if !self.bootstrap_source.allows_persistence() {
                    tracing::warn!(path = ?path, "Mapping file was unreadable at startup, not overwriting it");
                } else if let Err(e) = save_mappings(path, &self.store.snapshot()) {
                    tracing::error!(path = ?path, error = %e, "Failed to persist mappings");
                }
            }
        }
        tracing::info!("HTTP server stopped");
    }
}

/// Apply each reloaded mapping set to the store as one batch.
///
/// Reloads only add or overwrite; mappings created through `/add` survive.
fn spawn_reloader(store: PathStore, mut updates: mpsc::UnboundedReceiver<MappingUpdate>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(mappings) = updates.recv().await {
            let count = store.extend(mappings);
            metrics::record_mappings_added("reload", count);
            metrics::record_store_size(store.len());
            tracing::info!(count, total = store.len(), "Applied reloaded mappings");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use tower::ServiceExt;

    fn test_router(store: PathStore) -> Router {
        HttpServer::new(RedirectConfig::default(), store).router()
    }

    fn form_post(uri: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_redirect_hit() {
        let store = PathStore::with_entries([("/github", "https://github.com")]);
        let response = test_router(store).oneshot(get("/github")).await.unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "https://github.com");
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_redirect_miss() {
        let response = test_router(PathStore::new()).oneshot(get("/nope")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.contains("/nope"));
    }

    #[tokio::test]
    async fn test_redirect_decodes_percent_escapes() {
        let store = PathStore::new();
        let router = test_router(store.clone());

        let response = router
            .clone()
            .oneshot(form_post("/add", "path=%2Fhello+world&url=http%3A%2F%2Fy"))
            .await
            .unwrap();
        assert!(response.status().is_success());
        assert_eq!(store.lookup("/hello world").as_deref(), Some("http://y"));

        let response = router.clone().oneshot(get("/hello%20world")).await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "http://y");

        // Invalid UTF-8 once decoded is a plain miss.
        let response = router.oneshot(get("/%FF")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_redirect_decodes_non_ascii_paths() {
        let store = PathStore::with_entries([("/café", "https://cafe.example")]);
        let response = test_router(store).oneshot(get("/caf%C3%A9")).await.unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "https://cafe.example");
    }

    #[tokio::test]
    async fn test_add_repeated_key_takes_first_value() {
        let store = PathStore::new();
        let response = test_router(store.clone())
            .oneshot(form_post("/add", "path=/a&path=/b&url=http://first&url=http://second"))
            .await
            .unwrap();

        assert!(response.status().is_success());
        assert_eq!(store.lookup("/a").as_deref(), Some("http://first"));
        assert!(store.lookup("/b").is_none());
    }

    #[tokio::test]
    async fn test_redirect_matches_path_verbatim() {
        let store = PathStore::with_entries([("/docs", "https://docs.rs")]);
        let router = test_router(store);

        let trailing = router.clone().oneshot(get("/docs/")).await.unwrap();
        assert_eq!(trailing.status(), StatusCode::NOT_FOUND);

        // Query strings are not part of the path.
        let with_query = router.oneshot(get("/docs?x=1")).await.unwrap();
        assert_eq!(with_query.status(), StatusCode::FOUND);
    }

    #[tokio::test]
    async fn test_redirect_answers_any_method() {
        let store = PathStore::with_entries([("/go", "http://go")]);
        let request = Request::builder()
            .method(Method::DELETE)
            .uri("/go")
            .body(Body::empty())
            .unwrap();

        let response = test_router(store).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
    }

    #[tokio::test]
    async fn test_add_then_redirect() {
        let store = PathStore::new();
        let router = test_router(store.clone());

        let response = router
            .clone()
            .oneshot(form_post("/add", "path=/x&url=http://y"))
            .await
            .unwrap();
        assert!(response.status().is_success());
        assert_eq!(body_text(response).await, "Successfully mapped /x to http://y");
        assert_eq!(store.lookup("/x").as_deref(), Some("http://y"));

        let response = router.oneshot(get("/x")).await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "http://y");
    }

    #[tokio::test]
    async fn test_add_reads_query_string() {
        let store = PathStore::new();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/add?path=%2Fq&url=http%3A%2F%2Fq.example")
            .body(Body::empty())
            .unwrap();

        let response = test_router(store.clone()).oneshot(request).await.unwrap();
        assert!(response.status().is_success());
        assert_eq!(store.lookup("/q").as_deref(), Some("http://q.example"));
    }

    #[tokio::test]
    async fn test_add_missing_field() {
        let store = PathStore::new();
        let response = test_router(store.clone())
            .oneshot(form_post("/add", "path=/x"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Path and URL are required");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_add_wrong_method() {
        let response = test_router(PathStore::new()).oneshot(get("/add")).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_add_strict_validation() {
        let mut config = RedirectConfig::default();
        config.security.strict_validation = true;
        let store = PathStore::new();
        let router = HttpServer::new(config, store.clone()).router();

        let response = router.oneshot(form_post("/add", "path=/x&url=not-a-url")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_list_mappings() {
        let store = PathStore::with_entries([("/a", "http://a"), ("/b", "http://b")]);
        let response = test_router(store.clone()).oneshot(get("/mappings")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");

        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        let expected = serde_json::to_value(store.snapshot()).unwrap();
        assert_eq!(body, expected);
    }

    #[tokio::test]
    async fn test_list_wrong_method() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/mappings")
            .body(Body::empty())
            .unwrap();

        let response = test_router(PathStore::new()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_reserved_routes_shadow_mappings() {
        let store = PathStore::with_entries([("/mappings", "http://shadowed")]);
        let response = test_router(store).oneshot(get("/mappings")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key(header::LOCATION));
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let mut config = RedirectConfig::default();
        config.security.max_body_size = 16;
        let router = HttpServer::new(config, PathStore::new()).router();

        let response = router
            .oneshot(form_post("/add", "path=/long&url=http://a-rather-long-destination.example"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_reloader_applies_updates() {
        let store = PathStore::with_entries([("/api-added", "http://kept")]);
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = spawn_reloader(store.clone(), rx);

        tx.send([("/reloaded".to_string(), "http://new".to_string())].into_iter().collect())
            .unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(store.lookup("/reloaded").as_deref(), Some("http://new"));
        assert_eq!(store.lookup("/api-added").as_deref(), Some("http://kept"));
    }
}
