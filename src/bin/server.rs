use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use compintel_rs::ranking::{DEFAULT_TOP_LIMIT, DEFAULT_WINDOW_DAYS, RankedItem, window_start};
use compintel_rs::{
    Competitor, Coordinates, NewsFilter, NewsItem, NewsStore, RefreshStatus, StoreError,
    marker_radius, read_status, resolve, top_threats,
};

/// Server configuration
struct ServerConfig {
    port: u16,
    data_path: PathBuf,
    status_path: PathBuf,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            data_path: env::var("COMPINTEL_DATA")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/news.json")),
            status_path: env::var("COMPINTEL_STATUS")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("public/refresh_status.json")),
        }
    }
}

/// Application state shared across all requests
#[derive(Clone)]
struct AppState {
    store: NewsStore,
    status_path: Arc<PathBuf>,
    metrics: Arc<Metrics>,
}

/// Server metrics
struct Metrics {
    total_requests: AtomicU64,
    requests_in_flight: AtomicU64,
    start_time: Instant,
}

impl Metrics {
    fn track(&self) -> RequestGuard<'_> {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.requests_in_flight.fetch_add(1, Ordering::Relaxed);
        RequestGuard(&self.requests_in_flight)
    }
}

/// RAII guard for tracking in-flight requests
struct RequestGuard<'a>(&'a AtomicU64);

impl<'a> Drop for RequestGuard<'a> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "server=info,compintel_rs=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Read configuration from environment
    let config = ServerConfig::from_env();

    tracing::info!("Loading news snapshot from {}", config.data_path.display());
    let store = NewsStore::load(&config.data_path)
        .await
        .context("Failed to load news snapshot")?;

    // Build Axum app with routes
    let app = build_app(store, config.status_path);

    // Bind server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}", addr);

    // Run server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Build the Axum application with routes and middleware
fn build_app(store: NewsStore, status_path: PathBuf) -> Router {
    let metrics = Arc::new(Metrics {
        total_requests: AtomicU64::new(0),
        requests_in_flight: AtomicU64::new(0),
        start_time: Instant::now(),
    });

    let state = AppState {
        store,
        status_path: Arc::new(status_path),
        metrics,
    };

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // API routes
        .route("/api/competitors", get(list_competitors))
        .route("/api/news", get(list_news))
        .route("/api/news/:id", get(get_news))
        .route("/api/news/:id/read", post(mark_read))
        .route("/api/news/:id/star", post(mark_starred))
        .route("/api/map", get(news_map))
        .route("/api/top-threats", get(get_top_threats))
        .route("/api/refresh-status", get(refresh_status))
        .route("/api/metrics", get(get_metrics))
        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn list_competitors(State(state): State<AppState>) -> Json<ListResponse<Competitor>> {
    let _guard = state.metrics.track();
    Json(ListResponse::new(state.store.competitors().await))
}

/// List news items matching the query-string filter
async fn list_news(
    State(state): State<AppState>,
    Query(filter): Query<NewsFilter>,
) -> Result<Json<ListResponse<NewsItem>>, ApiError> {
    let _guard = state.metrics.track();

    let items = state.store.list(&filter).await?;
    tracing::debug!("Listing {} news item(s) for {:?}", items.len(), filter);

    Ok(Json(ListResponse::new(items)))
}

#[derive(Serialize)]
struct ListResponse<T> {
    success: bool,
    count: usize,
    data: Vec<T>,
}

impl<T> ListResponse<T> {
    fn new(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}

async fn get_news(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ItemResponse>, ApiError> {
    let _guard = state.metrics.track();
    let item = state.store.get(&id).await?;
    Ok(Json(ItemResponse {
        success: true,
        data: item,
    }))
}

/// Set or clear the read flag
async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<FlagRequest>, JsonRejection>,
) -> Result<Json<ItemResponse>, ApiError> {
    let _guard = state.metrics.track();
    let value = flag_value(body)?;

    tracing::info!("Marking {} read={}", id, value);
    let item = state.store.set_read(&id, value).await?;

    Ok(Json(ItemResponse {
        success: true,
        data: item,
    }))
}

/// Set or clear the starred flag
async fn mark_starred(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<FlagRequest>, JsonRejection>,
) -> Result<Json<ItemResponse>, ApiError> {
    let _guard = state.metrics.track();
    let value = flag_value(body)?;

    tracing::info!("Marking {} starred={}", id, value);
    let item = state.store.set_starred(&id, value).await?;

    Ok(Json(ItemResponse {
        success: true,
        data: item,
    }))
}

#[derive(Deserialize)]
struct FlagRequest {
    #[serde(default = "default_flag")]
    value: bool,
}

fn default_flag() -> bool {
    true
}

/// Flag value from an optional JSON body. A request without a JSON body
/// sets the flag; a body that is present but malformed is rejected.
fn flag_value(body: Result<Json<FlagRequest>, JsonRejection>) -> Result<bool, ApiError> {
    match body {
        Ok(Json(request)) => Ok(request.value),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(default_flag()),
        Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
    }
}

#[derive(Serialize)]
struct ItemResponse {
    success: bool,
    data: NewsItem,
}

/// Map buckets for the items matching the query-string filter
async fn news_map(
    State(state): State<AppState>,
    Query(filter): Query<NewsFilter>,
) -> Result<Json<MapResponse>, ApiError> {
    let _guard = state.metrics.track();

    let items = state.store.list(&filter).await?;
    let placement = resolve(&items);
    let max_count = placement.max_count();

    let buckets = placement
        .buckets
        .into_values()
        .map(|b| MapBucket {
            radius: marker_radius(b.count, max_count),
            name: b.name,
            coordinates: b.coordinates,
            count: b.count,
            max_severity: b.max_severity,
        })
        .collect();

    Ok(Json(MapResponse {
        success: true,
        total: items.len(),
        unresolved: placement.unresolved,
        buckets,
    }))
}

#[derive(Serialize)]
struct MapResponse {
    success: bool,
    total: usize,
    unresolved: usize,
    buckets: Vec<MapBucket>,
}

#[derive(Serialize)]
struct MapBucket {
    name: String,
    coordinates: Coordinates,
    count: usize,
    max_severity: i32,
    radius: f64,
}

async fn get_top_threats(
    State(state): State<AppState>,
    Query(params): Query<TopThreatsQuery>,
) -> Result<Json<ListResponse<RankedItem>>, ApiError> {
    let _guard = state.metrics.track();

    let days = params.days.unwrap_or(DEFAULT_WINDOW_DAYS);
    if days < 0 {
        return Err(ApiError::BadRequest("days cannot be negative".to_string()));
    }
    let now = Utc::now();
    if window_start(now, days).is_none() {
        return Err(ApiError::BadRequest(format!("days out of range: {}", days)));
    }
    let limit = params.limit.unwrap_or(DEFAULT_TOP_LIMIT);

    let items = state.store.all().await;
    let ranked = top_threats(&items, now, days, limit);

    Ok(Json(ListResponse::new(ranked)))
}

#[derive(Deserialize)]
struct TopThreatsQuery {
    #[serde(default)]
    days: Option<i64>,
    #[serde(default)]
    limit: Option<usize>,
}

/// Progress of the external ingester
async fn refresh_status(State(state): State<AppState>) -> Json<RefreshStatus> {
    let _guard = state.metrics.track();
    Json(read_status(&state.status_path).await)
}

/// Get server metrics
async fn get_metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        total_requests: state.metrics.total_requests.load(Ordering::Relaxed),
        requests_in_flight: state.metrics.requests_in_flight.load(Ordering::Relaxed),
        uptime_seconds: state.metrics.start_time.elapsed().as_secs(),
    })
}

#[derive(Serialize)]
struct MetricsResponse {
    total_requests: u64,
    requests_in_flight: u64,
    uptime_seconds: u64,
}

/// API error types
#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    NotFound(String),
    InternalError(String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => ApiError::NotFound(e.to_string()),
            StoreError::InvalidFilter(_) => ApiError::BadRequest(e.to_string()),
            StoreError::Persist(_) => {
                tracing::error!("Store error: {}", e);
                ApiError::InternalError(e.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "success": false,
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down gracefully...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}
