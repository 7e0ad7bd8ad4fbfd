//! Greeting endpoint

use axum::extract::State;
use axum::Json;
use peerlink_core::GreetingResponse;

use crate::state::AppState;

/// GET /api/greet
pub async fn greet(State(state): State<AppState>) -> Json<GreetingResponse> {
    tracing::info!("Greet endpoint called");
    Json(state.identity().greeting())
}
