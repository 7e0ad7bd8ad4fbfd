//! Identity and response models

mod identity;
mod response;

pub use identity::{display_name_for, InstanceIdentity, PeerIdentity, DEFAULT_PEER_PORT};
pub use response::{GreetingResponse, HealthResponse, ProxyResponse, NO_RESPONSE, STATUS_UP};
