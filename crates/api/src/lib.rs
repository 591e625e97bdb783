//! Soil Health API Server
//!
//! REST API for submitting soil test results, listing stored records and
//! computing agronomic advisories.

use advisory::AdvisoryEngine;
use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use storage::{BatchSize, SoilRepository};
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

pub mod error;
pub mod rate_limit;
pub mod routes;
pub mod service;
pub mod settings;
pub mod table;

use crate::error::ApiError;
use crate::service::{SoilService, MAX_BULK_RECORDS};
use crate::settings::{AppConfig, LoggingConfig};

/// Request body budget per bulk record; a serialized record is about 160 bytes
const BULK_RECORD_BYTES: usize = 256;

/// Application state shared across handlers
pub struct AppState {
    /// Form workflow over storage and advice
    pub service: SoilService,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
    /// Prometheus handle, absent when no recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new application state
    pub fn new(service: SoilService) -> Self {
        Self {
            service,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub database: ComponentHealth,
}

/// Individual component health
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: String,
    pub record_count: Option<i64>,
    pub error: Option<String>,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route(
            "/api/v1/records",
            get(routes::records::list_records).post(routes::records::create_record),
        )
        .route(
            "/api/v1/records/batch",
            post(routes::records::create_batch)
                .layer(DefaultBodyLimit::max(MAX_BULK_RECORDS * BULK_RECORD_BYTES)),
        )
        .route("/api/v1/records/table", get(routes::records::records_table))
        .route("/api/v1/advisories", post(routes::advisories::compute))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let (status, database) = match state.service.repository().count().await {
        Ok(count) => (
            "healthy",
            ComponentHealth {
                status: "ok".to_string(),
                record_count: Some(count),
                error: None,
            },
        ),
        Err(e) => (
            "degraded",
            ComponentHealth {
                status: "error".to_string(),
                record_count: None,
                error: Some(e.to_string()),
            },
        ),
    };

    Json(HealthResponse {
        status: status.to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        database,
    })
}

/// Prometheus exposition
async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed".to_string()),
    }
}

/// Initialize logging
pub fn init_logging(config: &LoggingConfig) -> Result<(), ApiError> {
    let level = Level::from_str(&config.level)
        .map_err(|_| ApiError::Logging(format!("unknown log level {:?}", config.level)))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let result = if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };

    result.map_err(|e| ApiError::Logging(e.to_string()))
}

/// Open the store and assemble the service from configuration
pub async fn build_state(config: &AppConfig) -> Result<AppState, ApiError> {
    let repository = SoilRepository::connect(&config.storage).await?;

    // The table may still be usable (or fixable) later; each request reports its own failure
    if let Err(e) = repository.ensure_schema().await {
        error!("{}", e);
    }

    let service = SoilService::new(
        repository,
        AdvisoryEngine::new(config.advisory.clone()),
        BatchSize::new(config.storage.batch_size),
    );
    Ok(AppState::new(service))
}

/// Run the server
pub async fn run_server(config: AppConfig) -> Result<(), ApiError> {
    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ApiError::Metrics(e.to_string()))?;

    let state = Arc::new(build_state(&config).await?.with_metrics(metrics));
    let mut app = create_router(state);

    if config.rate_limit.enabled {
        let governor = rate_limit::create_governor_config(&config.rate_limit)?;
        app = app.layer(GovernorLayer { config: governor });
    }

    info!("Starting API server on {}", config.server.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
