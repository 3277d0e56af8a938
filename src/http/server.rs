//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all web-service resources
//! - Wire up middleware (tracing, timeout, body limit, request ID)
//! - Bind server to listener
//! - Hand every web-service request to the dispatcher

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{HeaderMap, HeaderName, Method, Uri},
    response::Response,
    routing::{any, get},
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::setup_admin_router;
use crate::config::AppConfig;
use crate::genelinks::GeneLinks;
use crate::http::request::{body_error, request_id, service_request, UuidRequestId};
use crate::http::response::{respond, ErrorTally};
use crate::search::{ImageSearch, SearchHistoryService};
use crate::store::Store;
use crate::webservice::{dispatch, reject, Resource};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<Store>,
    pub gene_links: GeneLinks,
    pub search: ImageSearch,
    pub search_history: SearchHistoryService,
    pub errors: Arc<ErrorTally>,
    pub user_header: HeaderName,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<Store>) -> Self {
        let user_header = HeaderName::from_bytes(config.security.user_header.as_bytes())
            .unwrap_or_else(|_| HeaderName::from_static("x-username"));
        Self {
            config: Arc::new(config),
            gene_links: GeneLinks::new(store.clone()),
            search: ImageSearch::new(store.clone()),
            search_history: SearchHistoryService::new(store.clone()),
            store,
            errors: Arc::new(ErrorTally::new()),
            user_header,
        }
    }
}

/// HTTP server for the web services.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server over the given store.
    pub fn new(config: AppConfig, store: Arc<Store>) -> Self {
        let state = AppState::new(config, store);
        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(state: AppState) -> Router {
        let config = state.config.clone();
        let mut router = Router::new()
            .route("/api/geneLinks", any(gene_links_handler))
            .route("/api/search", any(search_handler))
            .route("/api/searchHistory", any(search_history_handler))
            .route("/health", get(health_handler))
            .with_state(state.clone());

        if config.admin.enabled {
            router = router.merge(setup_admin_router(state));
        }

        router
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// The router, for serving or for driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Parse the request and dispatch it to `resource`.
fn serve<R: Resource>(
    state: &AppState,
    resource: &R,
    method: Method,
    headers: HeaderMap,
    uri: Uri,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    tracing::debug!(
        request_id = %request_id(&headers),
        resource = resource.name(),
        method = %method,
        "Dispatching request"
    );
    let request = body
        .map_err(body_error)
        .and_then(|body| service_request(&headers, &uri, &body, &state.user_header));
    let envelope = match request {
        Ok(request) => dispatch(resource, &method, &request),
        Err(error) => reject(resource, &method, error),
    };
    respond(envelope, &state.errors)
}

async fn gene_links_handler(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    uri: Uri,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    serve(&state, &state.gene_links, method, headers, uri, body)
}

async fn search_handler(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    uri: Uri,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    serve(&state, &state.search, method, headers, uri, body)
}

async fn search_history_handler(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    uri: Uri,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    serve(&state, &state.search_history, method, headers, uri, body)
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
