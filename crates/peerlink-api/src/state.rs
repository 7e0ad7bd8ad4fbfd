//! Application state for the peerlink API

use std::sync::Arc;

use peerlink_core::{InstanceIdentity, PeerGreeter, PeerIdentity};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    identity: Arc<InstanceIdentity>,
    greeter: Arc<dyn PeerGreeter>,
}

impl AppState {
    pub fn new(identity: InstanceIdentity, greeter: Arc<dyn PeerGreeter>) -> Self {
        Self {
            identity: Arc::new(identity),
            greeter,
        }
    }

    /// This instance
    pub fn identity(&self) -> &InstanceIdentity {
        &self.identity
    }

    /// The peer this instance relays to
    pub fn peer(&self) -> &PeerIdentity {
        self.greeter.peer()
    }

    pub fn greeter(&self) -> &dyn PeerGreeter {
        self.greeter.as_ref()
    }
}
