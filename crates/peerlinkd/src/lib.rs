//! peerlinkd - peerlink daemon
//!
//! One instance of a symmetric service pair. Each instance serves its own
//! greeting and health over mutual TLS and relays its peer's greeting on
//! `/api/call-<peer>`, calling the peer with the same certificate it serves.
//!
//! The binary is a thin wrapper: configuration is loaded and merged with CLI
//! and environment overrides, [`Daemon::build`] turns it into a ready router
//! (failing fast on any TLS or config problem), and [`Daemon::serve`] runs it.

pub mod cli;
pub mod config;
mod daemon;
pub mod diagnostics;

pub use cli::Cli;
pub use config::{ConfigError, DaemonConfig};
pub use daemon::{Daemon, StartupError};
