//! peerlink-api - HTTP surface for a peerlink instance
//!
//! Serves three JSON endpoints over mutual TLS:
//!
//! - `GET /health` - liveness, never touches the peer
//! - `GET /api/greet` - this instance's greeting
//! - `GET /api/call-<peer>` - relays the peer's greeting through a [`PeerGreeter`]
//!
//! The router is transport-agnostic; [`server::serve_tls`] runs it behind a
//! rustls acceptor.
//!
//! # Usage
//!
//! ```ignore
//! use peerlink_api::{create_router, AppState};
//!
//! let state = AppState::new(identity, greeter);
//! let router = create_router(state);
//! serve_tls(listener, router, tls.server_config(), stats, shutdown).await?;
//! ```
//!
//! [`PeerGreeter`]: peerlink_core::PeerGreeter

pub mod error;
pub mod handlers;
pub mod server;
pub mod state;
pub mod testing;

pub use error::ApiError;
pub use server::{serve_tls, ConnectionStats};
pub use state::AppState;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

/// Create the router for this instance and its peer
pub fn create_router(state: AppState) -> Router {
    let proxy_path = state.peer().proxy_path();

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/greet", get(handlers::greet::greet))
        .route(&proxy_path, get(handlers::proxy::call_peer))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
