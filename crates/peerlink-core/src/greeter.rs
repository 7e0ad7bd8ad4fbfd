//! PeerGreeter trait - the seam between the HTTP layer and peer transport

use async_trait::async_trait;

use crate::models::PeerIdentity;

/// Asks the peer instance for its greeting.
///
/// Implementations own all peer-communication failure handling. The return
/// type is a plain `String`: every transport, TLS, timeout or decoding failure
/// must already be rendered into a human-readable message, so callers never
/// have to special-case errors.
#[async_trait]
pub trait PeerGreeter: Send + Sync {
    /// Identity of the peer this greeter talks to
    fn peer(&self) -> &PeerIdentity;

    /// Fetch the peer's greeting message, or a description of why it failed
    async fn fetch_peer_greeting(&self) -> String;
}
