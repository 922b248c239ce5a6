//! HTTP API, health and Prometheus endpoints
//!
//! This module exposes the rating engine over HTTP using Axum. Request
//! bodies are deserialized into explicit schemas and validated here; the
//! engine only ever sees typed, validated values.

use crate::error::RatingError;
use crate::metrics::encode_metrics;
use crate::service::app::AppState;
use crate::service::health::{HealthCheck, HealthStatus};
use crate::types::{
    EstimateRequest, EstimateResponse, ErrorResponse, PredictOutcomeRequest,
    PredictOutcomeResponse, SubmitMatchRequest, SubmitMatchResponse,
};
use crate::utils::generate_request_id;
use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info, info_span, warn};

/// Error payload for estimations naming an unknown player
pub const PLAYERS_NOT_FOUND: &str = "one or both players not found";

const ENDPOINTS: [&str; 10] = [
    "/update-rating",
    "/predict-unplayed",
    "/predict-outcome",
    "/players/{id}",
    "/health",
    "/ready",
    "/alive",
    "/stats",
    "/metrics",
    "/",
];

/// HTTP server for the rating API
pub struct ApiServer {
    app_state: Arc<AppState>,
    shutdown_tx: watch::Sender<bool>,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(app_state: Arc<AppState>) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            app_state,
            shutdown_tx,
        }
    }

    /// Bind to the configured address and serve until stopped
    pub async fn start(&self) -> Result<()> {
        let addr: SocketAddr = self
            .app_state
            .config()
            .bind_address()
            .parse()
            .context("Invalid HTTP server address")?;

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind HTTP server to {}", addr))?;

        self.serve(listener).await
    }

    /// Serve on an already bound listener until stopped
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr()?;
        info!("Rating API listening on http://{}", addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.wait_for(|stopped| *stopped).await;
                info!("HTTP server shutdown signal received");
            })
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }

    /// Create the Axum router with all endpoints
    pub fn router(&self) -> Router {
        create_router(self.app_state.clone())
    }

    /// Stop the server; takes effect even if `serve` has not started yet
    pub fn stop(&self) {
        info!("Stopping HTTP server...");
        self.shutdown_tx.send_replace(true);
    }
}

/// Build the router over shared application state
pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/update-rating", post(update_rating_handler))
        .route("/update-rating/", post(update_rating_handler))
        .route("/predict-unplayed", post(predict_unplayed_handler))
        .route("/predict-unplayed/", post(predict_unplayed_handler))
        .route("/predict-outcome", post(predict_outcome_handler))
        .route("/predict-outcome/", post(predict_outcome_handler))
        .route("/players/{id}", get(player_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/alive", get(alive_handler))
        .route("/stats", get(stats_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(app_state)
}

fn error_reply(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

/// Map an engine error onto an HTTP status and error payload
fn engine_error_reply(err: &anyhow::Error, not_found_message: &str) -> Response {
    match err.downcast_ref::<RatingError>() {
        Some(e) if e.is_not_found() => error_reply(StatusCode::NOT_FOUND, not_found_message),
        Some(RatingError::InvalidMatch { reason }) => {
            error_reply(StatusCode::UNPROCESSABLE_ENTITY, reason.clone())
        }
        _ => {
            error!("Rating engine failure: {:#}", err);
            error_reply(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
        }
    }
}

/// Root endpoint handler - shows service information
async fn root_handler() -> impl IntoResponse {
    Json(json!({
        "message": "Tennis Rating API is running",
        "version": crate::VERSION,
        "endpoints": ENDPOINTS,
    }))
}

/// Submit a completed match
async fn update_rating_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubmitMatchRequest>,
) -> Response {
    let span = info_span!("update_rating", request_id = %generate_request_id());
    let _guard = span.enter();
    let metrics = state.metrics();
    const ENDPOINT: &str = "/update-rating";

    let result = match request.into_match_result() {
        Ok(result) => result,
        Err(e) => {
            warn!("Rejected match submission: {}", e);
            metrics.record_rejection(ENDPOINT);
            metrics.record_request(ENDPOINT, 422);
            return engine_error_reply(&e, PLAYERS_NOT_FOUND);
        }
    };

    let timer = metrics.start_timer();
    match state.engine().record_match(&result) {
        Ok(outcome) => {
            metrics.record_match(&outcome, timer.stop());
            metrics.record_request(ENDPOINT, 200);
            info!(
                "Match recorded - {} def. {}: {} -> {}, {} -> {}",
                result.winner,
                result.loser,
                result.winner_rating,
                outcome.update.winner_new_rating,
                result.loser_rating,
                outcome.update.loser_new_rating
            );
            (
                StatusCode::OK,
                Json(SubmitMatchResponse::from(outcome.update)),
            )
                .into_response()
        }
        Err(e) => {
            let reply = engine_error_reply(&e, PLAYERS_NOT_FOUND);
            metrics.record_request(ENDPOINT, reply.status().as_u16());
            reply
        }
    }
}

/// Estimate a matchup that has not been played
async fn predict_unplayed_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EstimateRequest>,
) -> Response {
    let span = info_span!("predict_unplayed", request_id = %generate_request_id());
    let _guard = span.enter();
    let metrics = state.metrics();
    const ENDPOINT: &str = "/predict-unplayed";

    let timer = metrics.start_timer();
    match state
        .engine()
        .estimate_unplayed(&request.player1, &request.player2)
    {
        Ok(estimate) => {
            let outcome = if estimate.mutual_opponents.is_empty() {
                "direct"
            } else {
                "mutual_opponents"
            };
            metrics.record_estimation(outcome, timer.stop());
            metrics.record_request(ENDPOINT, 200);
            debug!(
                "Estimated {} vs {}: {} ({} mutual opponents)",
                request.player1,
                request.player2,
                estimate.estimated_rating_diff,
                estimate.mutual_opponents.len()
            );
            (
                StatusCode::OK,
                Json(EstimateResponse {
                    estimated_rating_diff: estimate.estimated_rating_diff,
                }),
            )
                .into_response()
        }
        Err(e) => {
            let not_found = e
                .downcast_ref::<RatingError>()
                .is_some_and(RatingError::is_not_found);
            if not_found {
                metrics.record_estimation("not_found", timer.stop());
            }
            let reply = engine_error_reply(&e, PLAYERS_NOT_FOUND);
            metrics.record_request(ENDPOINT, reply.status().as_u16());
            reply
        }
    }
}

/// Win probability for two ratings
async fn predict_outcome_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PredictOutcomeRequest>,
) -> Response {
    const ENDPOINT: &str = "/predict-outcome";
    let metrics = state.metrics();

    if !request.player1_rating.is_finite() || !request.player2_rating.is_finite() {
        metrics.record_rejection(ENDPOINT);
        metrics.record_request(ENDPOINT, 422);
        return error_reply(
            StatusCode::UNPROCESSABLE_ENTITY,
            "ratings must be finite numbers",
        );
    }

    let probability = state
        .engine()
        .win_probability(request.player1_rating, request.player2_rating);
    metrics.record_request(ENDPOINT, 200);

    (
        StatusCode::OK,
        Json(PredictOutcomeResponse {
            player1_win_probability: probability,
            player2_win_probability: 1.0 - probability,
        }),
    )
        .into_response()
}

/// Current rating of a single player
async fn player_handler(
    State(state): State<Arc<AppState>>,
    Path(player_id): Path<String>,
) -> Response {
    const ENDPOINT: &str = "/players";
    let metrics = state.metrics();

    let reply = match state.engine().player_summary(&player_id) {
        Ok(Some(summary)) => (StatusCode::OK, Json(summary)).into_response(),
        Ok(None) => error_reply(StatusCode::NOT_FOUND, "player not found"),
        Err(e) => engine_error_reply(&e, "player not found"),
    };

    metrics.record_request(ENDPOINT, reply.status().as_u16());
    reply
}

/// Full health report
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    debug!("Health check requested");

    match HealthCheck::check(state).await {
        Ok(health) => {
            let status = match health.status {
                HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::OK,
            };
            (status, Json(json!(health)))
        }
        Err(e) => {
            error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "service": "tennis-rating",
                    "version": crate::VERSION
                })),
            )
        }
    }
}

/// Readiness check endpoint handler
async fn ready_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    debug!("Readiness check requested");

    match HealthCheck::readiness_check(state).await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "Ready"),
        Ok(HealthStatus::Degraded) => (StatusCode::OK, "Degraded but ready"),
        Ok(HealthStatus::Unhealthy) => (StatusCode::SERVICE_UNAVAILABLE, "Not ready"),
        Err(e) => {
            error!("Readiness check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "Not ready")
        }
    }
}

/// Liveness check endpoint handler
async fn alive_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    debug!("Liveness check requested");

    match HealthCheck::liveness_check(state).await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "Alive"),
        _ => (StatusCode::SERVICE_UNAVAILABLE, "Not alive"),
    }
}

/// Rating graph statistics
async fn stats_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    debug!("Stats endpoint requested");

    match state.engine().stats() {
        Ok(stats) => (
            StatusCode::OK,
            Json(json!({
                "service": {
                    "name": state.config().service.name,
                    "version": crate::VERSION,
                    "uptimeSeconds": state.uptime_seconds(),
                },
                "players": stats.players,
                "matchEdges": stats.match_edges,
                "matchesRecorded": stats.matches_recorded,
                "timestamp": chrono::Utc::now(),
            })),
        ),
        Err(e) => {
            error!("Failed to get stats: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": "Failed to get service stats",
                    "timestamp": chrono::Utc::now(),
                })),
            )
        }
    }
}

/// Prometheus metrics endpoint handler
async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    debug!("Metrics endpoint requested");

    let metrics = state.metrics();
    if let Ok(stats) = state.engine().stats() {
        metrics.update_from_engine_stats(&stats);
    }

    match encode_metrics(&metrics) {
        Ok((text, content_type)) => {
            (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], text).into_response()
        }
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics".to_string(),
            )
                .into_response()
        }
    }
}
