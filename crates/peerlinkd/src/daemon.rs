//! Daemon bootstrap: config to TLS context to router to listener

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use peerlink_api::{create_router, serve_tls, AppState, ConnectionStats};
use peerlink_client::{ClientError, MtlsClient};
use peerlink_proxy::PeerProxyClient;
use peerlink_tls::{TlsConfigError, TlsContext};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::{ConfigError, DaemonConfig};
use crate::diagnostics::CertificateDiagnostics;

/// Anything that stops the daemon from starting or serving
#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Keystore or truststore unusable
    #[error("TLS configuration error: {0}")]
    Tls(#[from] TlsConfigError),

    /// Outbound client or peer URL unusable
    #[error("peer client error: {0}")]
    Client(#[from] ClientError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Server(#[source] std::io::Error),
}

/// A fully initialised instance, ready to bind and serve.
///
/// Built once at startup. TLS material, the outbound connection pool and the
/// router are all constructed here, so a `Daemon` that exists can serve.
pub struct Daemon {
    config: DaemonConfig,
    tls: TlsContext,
    router: Router,
    stats: Arc<ConnectionStats>,
}

impl Daemon {
    /// Validate `config` and build every long-lived component
    pub fn build(config: DaemonConfig) -> Result<Self, StartupError> {
        config.validate()?;

        let tls = TlsContext::builder()
            .keystore(&config.tls.keystore, config.tls.keystore_password.clone())
            .truststore(&config.tls.truststore, config.tls.truststore_password.clone())
            .client_auth(config.server.client_auth)
            .build()?;

        let summary = tls.summary();
        info!(
            keystore = %summary.keystore.display(),
            truststore = %summary.truststore.display(),
            chain_len = summary.chain_len,
            trust_anchors = summary.trust_anchors,
            client_auth = ?summary.client_auth,
            "Loaded TLS material"
        );

        let client = MtlsClient::with_settings(tls.client_config(), config.peer.client_settings())?;
        let greeter = PeerProxyClient::new(client, config.peer.identity())?;
        info!(
            peer = %config.peer.name,
            url = %greeter.greet_url(),
            "Configured peer"
        );

        let state = AppState::new(config.service.identity(), Arc::new(greeter));
        let router = create_router(state);

        Ok(Self {
            config,
            tls,
            router,
            stats: Arc::new(ConnectionStats::new()),
        })
    }

    pub fn config(&self) -> &DaemonConfig {
        &self.config
    }

    pub fn tls(&self) -> &TlsContext {
        &self.tls
    }

    pub fn stats(&self) -> Arc<ConnectionStats> {
        self.stats.clone()
    }

    /// Bind the configured listen address
    pub async fn bind(&self) -> Result<TcpListener, StartupError> {
        let addr = self.config.server.bind;
        TcpListener::bind(addr)
            .await
            .map_err(|source| StartupError::Bind { addr, source })
    }

    /// Serve on `listener` until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), StartupError>
    where
        F: Future<Output = ()> + Send,
    {
        info!(
            service = %self.config.service.name,
            peer = %self.config.peer.name,
            "Ready"
        );

        if self.config.diagnostics.enabled {
            let summary = self.tls.summary();
            CertificateDiagnostics::new(
                self.config.diagnostics.tool.clone(),
                summary.keystore.clone(),
                summary.truststore.clone(),
            )
            .spawn();
        }

        serve_tls(
            listener,
            self.router,
            self.tls.server_config(),
            self.stats,
            shutdown,
        )
        .await
        .map_err(StartupError::Server)
    }
}
