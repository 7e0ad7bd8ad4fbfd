//! End-to-end tests for peerlink
//!
//! Runs pairs of in-process daemons on ephemeral localhost ports, each with
//! its own certificate from `testdata/certs`, and drives them through their
//! public HTTPS endpoints.
//!
//! # Test Structure
//!
//! - `pair_e2e.rs` - two instances calling each other
//! - `failure_e2e.rs` - unreachable and untrusted peers

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use peerlink_api::ConnectionStats;
use peerlink_client::MtlsClient;
use peerlink_tls::TlsContext;
use peerlinkd::{Daemon, DaemonConfig};
use tokio::net::TcpListener;
use url::Url;

/// Path to a PEM fixture under `testdata/certs`
pub fn cert(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../testdata/certs")
        .join(name)
}

/// Configuration for one instance of the pair
pub fn instance_config(service: &str, keystore: &str, peer: &str, peer_port: u16) -> DaemonConfig {
    let content = format!(
        r#"
        [service]
        name = "{service}"

        [server]
        bind = "127.0.0.1:0"

        [tls]
        keystore = "{keystore}"
        truststore = "{truststore}"

        [peer]
        name = "{peer}"
        url = "https://localhost:{peer_port}"
        timeout_ms = 3000
        connect_timeout_ms = 1000

        [diagnostics]
        enabled = false
        "#,
        keystore = cert(keystore).display(),
        truststore = cert("truststore.pem").display(),
    );
    toml::from_str(&content).expect("test config parses")
}

/// Reserve a localhost port by binding it
pub async fn reserve() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    (listener, port)
}

/// A port nothing listens on
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    listener.local_addr().expect("local addr").port()
}

/// A running daemon that stops when dropped
pub struct Instance {
    pub port: u16,
    pub stats: Arc<ConnectionStats>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Instance {
    /// Build and serve `config` on an already bound listener
    pub fn start(config: DaemonConfig, listener: TcpListener) -> Self {
        let port = listener.local_addr().expect("local addr").port();
        let daemon = Daemon::build(config).expect("daemon builds");
        let stats = daemon.stats();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let handle = tokio::spawn(async move {
            daemon
                .serve(listener, async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        Self {
            port,
            stats,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn url(&self, path: &str) -> Url {
        Url::parse(&format!("https://localhost:{}{}", self.port, path)).expect("valid url")
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Two instances, each configured with the other as its peer
pub struct Pair {
    pub a: Instance,
    pub b: Instance,
}

impl Pair {
    pub async fn start() -> Self {
        let (listener_a, port_a) = reserve().await;
        let (listener_b, port_b) = reserve().await;

        let a = Instance::start(
            instance_config("app-a", "app-a.keystore.pem", "app-b", port_b),
            listener_a,
        );
        let b = Instance::start(
            instance_config("app-b", "app-b.keystore.pem", "app-a", port_a),
            listener_b,
        );
        Self { a, b }
    }
}

/// External caller holding a trusted certificate
pub fn caller() -> MtlsClient {
    let tls = TlsContext::builder()
        .keystore(cert("app-a.keystore.pem"), None)
        .truststore(cert("truststore.pem"), None)
        .build()
        .expect("fixture TLS material loads");
    MtlsClient::new(tls.client_config()).expect("client builds")
}

/// GET `url` and return the raw body as text
pub async fn get_text(client: &MtlsClient, url: &Url) -> String {
    let body: Bytes = client.get(url).await.expect("request succeeds");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}

/// GET `url` and parse the body as JSON
pub async fn get_json(client: &MtlsClient, url: &Url) -> serde_json::Value {
    serde_json::from_str(&get_text(client, url).await).expect("JSON body")
}
