//! Pooled mTLS HTTP client implementation

use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{ClientError, Result};
use crate::limits::HostLimiter;

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default connection timeout
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default idle connections kept per host
const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 4;
/// Default lifetime of an idle pooled connection
const DEFAULT_POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
/// Default cap on in-flight requests per host
const DEFAULT_MAX_CONNECTIONS_PER_HOST: usize = 32;

/// Timeouts and pool bounds for [`MtlsClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Deadline for a whole call: slot wait, connect, handshake, request, body
    pub timeout: Duration,
    /// Deadline for establishing the TCP connection
    pub connect_timeout: Duration,
    /// Idle connections kept per host for reuse
    pub pool_max_idle_per_host: usize,
    /// Idle connections older than this are closed
    pub pool_idle_timeout: Duration,
    /// In-flight requests (and therefore open connections) allowed per host
    pub max_connections_per_host: usize,
}

impl ClientSettings {
    /// Deadline that applies to a timeout in the given phase
    pub(crate) fn deadline(&self, connecting: bool) -> Duration {
        if connecting {
            self.connect_timeout
        } else {
            self.timeout
        }
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            pool_idle_timeout: DEFAULT_POOL_IDLE_TIMEOUT,
            max_connections_per_host: DEFAULT_MAX_CONNECTIONS_PER_HOST,
        }
    }
}

/// HTTP client presenting a client certificate on every connection.
///
/// Cloning shares the connection pool and host limits, so a single instance
/// built at startup can be handed to every request handler.
#[derive(Debug, Clone)]
pub struct MtlsClient {
    client: Client,
    limiter: HostLimiter,
    settings: ClientSettings,
}

impl MtlsClient {
    /// Create a client with default settings
    pub fn new(tls: rustls::ClientConfig) -> Result<Self> {
        Self::with_settings(tls, ClientSettings::default())
    }

    /// Create a client with custom timeouts and pool bounds
    pub fn with_settings(tls: rustls::ClientConfig, settings: ClientSettings) -> Result<Self> {
        let client = Client::builder()
            .use_preconfigured_tls(tls)
            .https_only(true)
            .timeout(settings.timeout)
            .connect_timeout(settings.connect_timeout)
            .pool_max_idle_per_host(settings.pool_max_idle_per_host)
            .pool_idle_timeout(settings.pool_idle_timeout)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(Self {
            client,
            limiter: HostLimiter::new(settings.max_connections_per_host),
            settings,
        })
    }

    /// Issue a GET and return the body of a 2xx response.
    ///
    /// The whole call is bounded by the configured timeout. Dropping the
    /// returned future cancels the request.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get(&self, url: &Url) -> Result<Bytes> {
        if url.scheme() != "https" {
            return Err(ClientError::InsecureUrl(url.to_string()));
        }

        let deadline = self.settings.timeout;
        match tokio::time::timeout(deadline, self.send(url)).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout(deadline)),
        }
    }

    /// GET and decode a JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        let body = self.get(url).await?;
        serde_json::from_slice(&body).map_err(|e| ClientError::Malformed(e.to_string()))
    }

    async fn send(&self, url: &Url) -> Result<Bytes> {
        let _permit = self.limiter.acquire(url).await?;

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, &self.settings))?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "Peer returned error status");
            return Err(ClientError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::from_reqwest(e, &self.settings))?;

        debug!(status = status.as_u16(), bytes = body.len(), "Peer responded");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_config() -> rustls::ClientConfig {
        let provider = std::sync::Arc::new(rustls::crypto::ring::default_provider());
        rustls::ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .unwrap()
            .with_root_certificates(rustls::RootCertStore::empty())
            .with_no_client_auth()
    }

    #[test]
    fn default_settings() {
        let settings = ClientSettings::default();
        assert_eq!(settings.timeout, Duration::from_secs(10));
        assert_eq!(settings.connect_timeout, Duration::from_secs(5));
        assert_eq!(settings.pool_max_idle_per_host, 4);
        assert_eq!(settings.max_connections_per_host, 32);
    }

    #[test]
    fn connect_phase_uses_connect_timeout() {
        let settings = ClientSettings {
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_millis(500),
            ..Default::default()
        };
        assert_eq!(settings.deadline(true), Duration::from_millis(500));
        assert_eq!(settings.deadline(false), Duration::from_secs(10));

        let err = ClientError::Timeout(settings.deadline(true));
        assert_eq!(err.to_string(), "request timed out after 500ms");
    }

    #[tokio::test]
    async fn rejects_plaintext_url() {
        let client = MtlsClient::new(client_config()).unwrap();
        let url = Url::parse("http://localhost:8080/api/greet").unwrap();

        let err = client.get(&url).await.unwrap_err();
        assert!(matches!(err, ClientError::InsecureUrl(_)));
    }

    #[tokio::test]
    async fn connection_refused_is_transport_error() {
        let client = MtlsClient::new(client_config()).unwrap();
        // Bind then drop to get a port nothing listens on
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let url = Url::parse(&format!("https://127.0.0.1:{port}/api/greet")).unwrap();

        let err = client.get(&url).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)), "unexpected: {err:?}");
    }
}
