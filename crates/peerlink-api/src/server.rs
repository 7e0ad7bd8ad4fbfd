//! TLS accept loop serving the router over HTTP/1.1 and HTTP/2

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use hyper_util::service::TowerToHyperService;
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, info, warn};

/// Deadline for a client to complete the TLS handshake
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause after a failed accept, so fd exhaustion does not spin the loop
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Counters for the inbound listener
#[derive(Debug, Default)]
pub struct ConnectionStats {
    accepted: AtomicU64,
    handshakes: AtomicU64,
    failed_handshakes: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// TCP connections accepted
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    /// TLS handshakes completed
    pub fn handshakes(&self) -> u64 {
        self.handshakes.load(Ordering::Relaxed)
    }

    /// TLS handshakes that failed or timed out
    pub fn failed_handshakes(&self) -> u64 {
        self.failed_handshakes.load(Ordering::Relaxed)
    }
}

/// Serve `router` on `listener` behind TLS until `shutdown` resolves.
///
/// Every accepted connection must complete a handshake against `tls` before
/// any HTTP is read; with client authentication required, callers without a
/// certificate chaining to the trust anchors never reach a handler.
/// Connections already being served are left to finish after shutdown.
pub async fn serve_tls<F>(
    listener: TcpListener,
    router: Router,
    tls: Arc<ServerConfig>,
    stats: Arc<ConnectionStats>,
    shutdown: F,
) -> io::Result<()>
where
    F: Future<Output = ()> + Send,
{
    let acceptor = TlsAcceptor::from(tls);
    let local_addr = listener.local_addr()?;
    info!(%local_addr, "TLS server listening");

    tokio::pin!(shutdown);

    loop {
        let (stream, remote_addr) = tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(error = %e, "Failed to accept connection");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            },
        };

        stats.accepted.fetch_add(1, Ordering::Relaxed);
        tokio::spawn(serve_connection(
            stream,
            remote_addr,
            acceptor.clone(),
            router.clone(),
            stats.clone(),
        ));
    }

    info!(
        accepted = stats.accepted(),
        handshakes = stats.handshakes(),
        failed_handshakes = stats.failed_handshakes(),
        "TLS server stopped accepting connections"
    );
    Ok(())
}

async fn serve_connection(
    stream: TcpStream,
    remote_addr: SocketAddr,
    acceptor: TlsAcceptor,
    router: Router,
    stats: Arc<ConnectionStats>,
) {
    let tls_stream = match tokio::time::timeout(HANDSHAKE_TIMEOUT, acceptor.accept(stream)).await {
        Ok(Ok(tls_stream)) => tls_stream,
        Ok(Err(e)) => {
            stats.failed_handshakes.fetch_add(1, Ordering::Relaxed);
            warn!(%remote_addr, error = %e, "TLS handshake failed");
            return;
        }
        Err(_) => {
            stats.failed_handshakes.fetch_add(1, Ordering::Relaxed);
            warn!(%remote_addr, "TLS handshake timed out");
            return;
        }
    };
    stats.handshakes.fetch_add(1, Ordering::Relaxed);

    let (_, session) = tls_stream.get_ref();
    debug!(
        %remote_addr,
        alpn = ?session.alpn_protocol().map(String::from_utf8_lossy),
        client_certs = session.peer_certificates().map_or(0, |certs| certs.len()),
        "TLS handshake complete"
    );

    let service = TowerToHyperService::new(router);
    if let Err(e) = auto::Builder::new(TokioExecutor::new())
        .serve_connection(TokioIo::new(tls_stream), service)
        .await
    {
        debug!(%remote_addr, error = %e, "Connection closed with error");
    }
}
