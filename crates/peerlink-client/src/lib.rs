//! peerlink Client Library
//!
//! A pooled HTTP client that authenticates with a client certificate and
//! only talks to servers whose certificate chains to the configured trust
//! anchors.
//!
//! # Example
//!
//! ```rust,no_run
//! use peerlink_client::{ClientSettings, MtlsClient};
//! use peerlink_tls::TlsContext;
//!
//! # async fn run(context: TlsContext) -> peerlink_client::Result<()> {
//! let client = MtlsClient::with_settings(context.client_config(), ClientSettings::default())?;
//! let url = url::Url::parse("https://app-b.default.svc.cluster.local:8443/api/greet")?;
//! let body = client.get(&url).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Connections are pooled per host and reused by sequential calls. Every call
//! is bounded by the request timeout; failures are classified into
//! [`ClientError`] variants so callers can tell a certificate problem from a
//! refused connection or a slow peer.

mod client;
mod error;
mod limits;

pub use client::{ClientSettings, MtlsClient};
pub use error::{ClientError, Result};
