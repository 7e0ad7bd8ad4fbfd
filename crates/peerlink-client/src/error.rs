//! Error types for peer client operations

use std::error::Error as StdError;
use std::time::Duration;

use rustls::AlertDescription;
use thiserror::Error;

use crate::client::ClientSettings;

/// Result type alias for peer client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur while calling a peer
#[derive(Error, Debug)]
pub enum ClientError {
    /// Peer certificate failed chain validation, or the peer rejected ours
    #[error("TLS validation failed: {0}")]
    TlsValidation(String),

    /// TLS handshake failed for a reason other than certificate validation
    #[error("TLS handshake failed: {0}")]
    Handshake(String),

    /// Connection refused, DNS failure, reset
    #[error("transport error: {0}")]
    Transport(String),

    /// The call exceeded its deadline
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Peer answered with a non-2xx status
    #[error("peer returned HTTP {status}")]
    Status { status: u16 },

    /// Peer answered with a body that could not be decoded
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Target URL is not https
    #[error("refusing non-TLS URL: {0}")]
    InsecureUrl(String),

    /// Invalid URL
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Build(String),
}

impl ClientError {
    /// Classify a reqwest failure by inspecting its source chain
    pub(crate) fn from_reqwest(err: reqwest::Error, settings: &ClientSettings) -> Self {
        if let Some(tls) = find_rustls_error(&err) {
            return Self::from_rustls(tls);
        }
        if err.is_timeout() {
            return Self::Timeout(settings.deadline(err.is_connect()));
        }
        if err.is_decode() {
            return Self::Malformed(error_chain(&err));
        }
        Self::Transport(error_chain(&err))
    }

    fn from_rustls(err: &rustls::Error) -> Self {
        match err {
            rustls::Error::InvalidCertificate(_) | rustls::Error::NoCertificatesPresented => {
                Self::TlsValidation(err.to_string())
            }
            rustls::Error::AlertReceived(alert) if is_certificate_alert(*alert) => {
                Self::TlsValidation(format!("peer rejected our certificate ({err})"))
            }
            other => Self::Handshake(other.to_string()),
        }
    }

    pub fn is_tls_validation(&self) -> bool {
        matches!(self, Self::TlsValidation(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

fn is_certificate_alert(alert: AlertDescription) -> bool {
    matches!(
        alert,
        AlertDescription::BadCertificate
            | AlertDescription::UnsupportedCertificate
            | AlertDescription::CertificateRevoked
            | AlertDescription::CertificateExpired
            | AlertDescription::CertificateUnknown
            | AlertDescription::UnknownCA
            | AlertDescription::CertificateRequired
            | AlertDescription::AccessDenied
    )
}

/// Find a rustls error anywhere in a source chain.
///
/// TLS streams report rustls errors wrapped in `io::Error`, whose `source()`
/// skips the wrapped error, so io errors are unwrapped explicitly.
fn find_rustls_error<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a rustls::Error> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(tls) = e.downcast_ref::<rustls::Error>() {
            return Some(tls);
        }
        if let Some(tls) = e
            .downcast_ref::<std::io::Error>()
            .and_then(|io| io.get_ref())
            .and_then(|inner| inner.downcast_ref::<rustls::Error>())
        {
            return Some(tls);
        }
        current = e.source();
    }
    None
}

/// Render an error and its causes on one line
pub(crate) fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
