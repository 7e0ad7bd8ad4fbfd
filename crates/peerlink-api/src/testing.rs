//! Test utilities for peerlink-api
//!
//! Runs a router behind the TLS server loop on an ephemeral port.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio_rustls::rustls::ServerConfig;

use crate::server::{serve_tls, ConnectionStats};

/// A TLS test server that automatically shuts down when dropped
pub struct TestServer {
    pub addr: SocketAddr,
    stats: Arc<ConnectionStats>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    /// Start serving `router` with the given TLS configuration
    ///
    /// # Example
    ///
    /// ```ignore
    /// use peerlink_api::testing::TestServer;
    ///
    /// let server = TestServer::start(router, tls.server_config()).await?;
    /// let url = server.url("/api/greet");
    /// ```
    pub async fn start(router: Router, tls: Arc<ServerConfig>) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let stats = Arc::new(ConnectionStats::new());

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn({
            let stats = stats.clone();
            async move {
                serve_tls(listener, router, tls, stats, async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
            }
        });

        Ok(Self {
            addr,
            stats,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Base URL using the `localhost` name the test certificates are issued for
    pub fn base_url(&self) -> String {
        format!("https://localhost:{}", self.addr.port())
    }

    /// Absolute URL for `path`
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    pub fn stats(&self) -> &ConnectionStats {
        &self.stats
    }

    /// Stop accepting connections and wait for the accept loop to exit
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
