//! HTTP server for metrics and published verification records.
//!
//! Besides Prometheus metrics, the server exposes the records of the
//! game it was last fed, so a remote auditor can cross-check its own
//! copy against them.

use crate::audit::FairnessReport;
use crate::engine::{EntropyEngine, VerificationRecord};
use crate::metrics::{MetricsRegistry, MetricsSnapshot};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

/// Errors that can occur during server operations.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not bind.
    #[error("failed to bind to address: {0}")]
    Bind(#[from] std::io::Error),

    /// The server stopped with an error.
    #[error("server error: {0}")]
    Server(String),
}

/// Configuration for the verification server.
#[derive(Debug, Clone)]
pub struct MetricsServerConfig {
    /// Address to bind the server to.
    pub bind_addr: SocketAddr,
}

impl Default for MetricsServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], 9090).into(),
        }
    }
}

impl MetricsServerConfig {
    /// Creates a config with a custom port.
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], port).into(),
        }
    }
}

/// State published to the server.
pub struct VerificationState {
    registry: MetricsRegistry,
    game_id: Option<String>,
    records: BTreeMap<u64, VerificationRecord>,
    report: Option<FairnessReport>,
}

impl VerificationState {
    /// Copies records, metrics and the latest report from a game.
    pub fn publish(&mut self, engine: &EntropyEngine, report: FairnessReport) {
        self.registry
            .update(&MetricsSnapshot::from_report(engine, &report));
        self.game_id = Some(engine.game_id().to_string());
        self.records = engine.verification_records().clone();
        self.report = Some(report);

        tracing::debug!(
            game_id = engine.game_id(),
            records = self.records.len(),
            "Published verification state"
        );
    }

    fn record(&self, game_id: &str, draw_id: u64) -> Option<&VerificationRecord> {
        if self.game_id.as_deref() != Some(game_id) {
            return None;
        }
        self.records.get(&draw_id)
    }
}

type SharedState = Arc<RwLock<VerificationState>>;

/// HTTP server for metrics and verification records.
pub struct MetricsServer {
    config: MetricsServerConfig,
    state: SharedState,
}

impl MetricsServer {
    /// Creates a new server.
    pub fn new(config: MetricsServerConfig, registry: MetricsRegistry) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(VerificationState {
                registry,
                game_id: None,
                records: BTreeMap::new(),
                report: None,
            })),
        }
    }

    /// Returns a reference to the shared state for publishing.
    pub fn state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    fn router(state: SharedState) -> Router {
        Router::new()
            .route("/metrics", get(metrics_handler))
            .route("/health", get(health_handler))
            .route("/report", get(report_handler))
            .route("/verification/:game_id/:draw_id", get(record_handler))
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Starts the HTTP server.
    ///
    /// This method runs the server until it is shut down.
    pub async fn run(self) -> Result<(), ServerError> {
        let app = Self::router(self.state);
        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        tracing::info!(
            addr = %self.config.bind_addr,
            "Verification server listening"
        );

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Server(e.to_string()))?;

        Ok(())
    }
}

/// Handler for the /metrics endpoint.
async fn metrics_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let state = state.read().await;

    match state.registry.encode() {
        Ok(output) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            output,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {}", e),
        ),
    }
}

/// Handler for the /health endpoint.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Handler for the /report endpoint.
async fn report_handler(
    State(state): State<SharedState>,
) -> Result<Json<FairnessReport>, StatusCode> {
    let state = state.read().await;
    state.report.clone().map(Json).ok_or(StatusCode::NOT_FOUND)
}

/// Handler for /verification/:game_id/:draw_id.
async fn record_handler(
    State(state): State<SharedState>,
    Path((game_id, draw_id)): Path<(String, u64)>,
) -> Result<Json<VerificationRecord>, StatusCode> {
    let state = state.read().await;
    state
        .record(&game_id, draw_id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}
