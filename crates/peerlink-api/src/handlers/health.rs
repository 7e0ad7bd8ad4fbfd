//! Liveness endpoint

use axum::extract::State;
use axum::Json;
use peerlink_core::HealthResponse;

use crate::state::AppState;

/// GET /health
///
/// Reports UP for as long as the process serves requests. The peer is not
/// consulted.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    tracing::info!("Health check endpoint called");
    Json(state.identity().health())
}
