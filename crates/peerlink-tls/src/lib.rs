//! peerlink-tls - Mutual TLS material for peerlink services
//!
//! Loads a keystore (certificate chain + private key, optionally encrypted)
//! and a truststore (CA anchors) from PEM files and turns them into an
//! immutable [`TlsContext`]. The context carries both halves of mTLS:
//!
//! - a rustls `ClientConfig` that presents this instance's certificate and
//!   only accepts peers chaining to the trust anchors
//! - a rustls `ServerConfig` that presents the same certificate to inbound
//!   callers and verifies their client certificates
//!
//! Construction is all-or-nothing: either every store loads and both configs
//! build, or [`TlsContextBuilder::build`] returns an error and nothing usable
//! exists.
//!
//! ```rust,no_run
//! use peerlink_tls::{Secret, TlsContext};
//!
//! # fn main() -> Result<(), peerlink_tls::TlsConfigError> {
//! let context = TlsContext::builder()
//!     .keystore("/etc/peerlink/app-a.keystore.pem", Some(Secret::new("changeit")))
//!     .truststore("/etc/peerlink/truststore.pem", None)
//!     .build()?;
//! let client_config = context.client_config();
//! # Ok(())
//! # }
//! ```

mod context;
mod error;
mod secret;
mod store;

pub use context::{ClientAuthMode, MaterialSummary, TlsContext, TlsContextBuilder};
pub use error::{Result, TlsConfigError};
pub use secret::Secret;
pub use store::{resource_path, Keystore, Truststore};
