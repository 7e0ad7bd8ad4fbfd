//! Error types for TLS material loading

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for TLS material operations
pub type Result<T> = std::result::Result<T, TlsConfigError>;

/// Errors raised while building a TLS context.
///
/// Every variant is fatal at startup; there is no partially usable context.
#[derive(Error, Debug)]
pub enum TlsConfigError {
    /// A store path was never configured
    #[error("no {0} configured")]
    MissingStore(&'static str),

    /// Store file missing or unreadable
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// PEM framing is broken
    #[error("malformed PEM in {}: {source}", path.display())]
    Pem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Keystore holds no certificate
    #[error("no certificate found in keystore {}", path.display())]
    NoCertificates { path: PathBuf },

    /// Keystore holds no private key
    #[error("no private key found in keystore {}", path.display())]
    NoPrivateKey { path: PathBuf },

    /// Keystore key is encrypted but no password was supplied
    #[error("keystore {} holds an encrypted private key but no password is configured", path.display())]
    MissingPassword { path: PathBuf },

    /// Wrong password or unsupported key encryption
    #[error("failed to decrypt private key in {}: {reason}", path.display())]
    KeyDecryption { path: PathBuf, reason: String },

    /// Truststore holds no certificate
    #[error("no trust anchors found in truststore {}", path.display())]
    EmptyTruststore { path: PathBuf },

    /// A truststore certificate cannot be used as a trust anchor
    #[error("invalid trust anchor in {}: {reason}", path.display())]
    InvalidTrustAnchor { path: PathBuf, reason: String },

    /// Client certificate verifier could not be built
    #[error("failed to build client certificate verifier: {0}")]
    ClientVerifier(String),

    /// rustls rejected the key material
    #[error("invalid TLS material: {0}")]
    Rustls(#[from] rustls::Error),
}
