//! peerlink-core - Core traits and types for peerlink services
//!
//! A peerlink instance exposes a greeting, a health check and a proxy route
//! that relays the greeting of its peer. This crate holds the identity and
//! response models those routes produce, and the [`PeerGreeter`] abstraction
//! the HTTP layer uses to reach the peer without knowing about transports.

pub mod greeter;
pub mod models;

pub use greeter::PeerGreeter;
pub use models::*;
