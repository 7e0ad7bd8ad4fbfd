//! Peer relay endpoint

use axum::extract::State;
use axum::Json;
use peerlink_core::ProxyResponse;

use crate::state::AppState;

/// GET /api/call-<peer>
///
/// Calls the peer exactly once and relays its greeting. Always answers 200;
/// peer failures arrive as a descriptive string in the relayed value. The
/// outbound call is awaited inline, so a caller that disconnects cancels it.
pub async fn call_peer(State(state): State<AppState>) -> Json<ProxyResponse> {
    let peer = state.peer();
    tracing::info!(peer = %peer.name, "Call {} endpoint called", peer.display_name);

    let response = state.greeter().fetch_peer_greeting().await;

    Json(ProxyResponse::new(
        state.identity().service_name.clone(),
        peer.response_key(),
        response,
    ))
}
