//! Tests for the TLS server loop using raw rustls connections
//!
//! Covers mutual authentication at the listener and the connection counters.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use peerlink_api::testing::TestServer;
use peerlink_api::{create_router, AppState};
use peerlink_core::{InstanceIdentity, PeerGreeter, PeerIdentity};
use peerlink_tls::{ClientAuthMode, TlsContext};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::ClientConfig;
use tokio_rustls::TlsConnector;

// =============================================================================
// Fixtures
// =============================================================================

fn cert(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../testdata/certs")
        .join(name)
}

fn context(keystore: &str, truststore: &str) -> TlsContext {
    TlsContext::builder()
        .keystore(cert(keystore), None)
        .truststore(cert(truststore), None)
        .build()
        .unwrap()
}

struct StaticGreeter(PeerIdentity);

#[async_trait]
impl PeerGreeter for StaticGreeter {
    fn peer(&self) -> &PeerIdentity {
        &self.0
    }

    async fn fetch_peer_greeting(&self) -> String {
        "Hello from App A".to_string()
    }
}

async fn start_app_b(client_auth: ClientAuthMode) -> TestServer {
    let tls = TlsContext::builder()
        .keystore(cert("app-b.keystore.pem"), None)
        .truststore(cert("truststore.pem"), None)
        .client_auth(client_auth)
        .build()
        .unwrap();
    let state = AppState::new(
        InstanceIdentity::new("app-b"),
        Arc::new(StaticGreeter(PeerIdentity::new("app-a"))),
    );
    TestServer::start(create_router(state), tls.server_config())
        .await
        .unwrap()
}

/// HTTP/1.1 GET over a fresh TLS connection, returning the raw response
async fn raw_get(config: ClientConfig, addr: SocketAddr, path: &str) -> io::Result<String> {
    let connector = TlsConnector::from(Arc::new(config));
    let tcp = TcpStream::connect(addr).await?;
    let server_name = ServerName::try_from("localhost").unwrap();
    let mut tls = connector.connect(server_name, tcp).await?;

    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    tls.write_all(request.as_bytes()).await?;
    tls.flush().await?;

    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        match tls.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
            // Peer closed without close_notify after sending the full response
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof && !buf.is_empty() => break,
            Err(e) => return Err(e),
        }
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not reached");
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn trusted_client_is_served() {
    let server = start_app_b(ClientAuthMode::Required).await;
    let client = context("app-a.keystore.pem", "truststore.pem").client_config();

    let response = raw_get(client, server.addr, "/api/greet").await.unwrap();

    assert!(response.starts_with("HTTP/1.1 200"), "got: {response}");
    assert!(response.contains(r#"{"message":"Hello from App B","service":"app-b"}"#));
    assert_eq!(server.stats().handshakes(), 1);
    assert_eq!(server.stats().failed_handshakes(), 0);
}

#[tokio::test]
async fn untrusted_client_certificate_is_rejected() {
    let server = start_app_b(ClientAuthMode::Required).await;
    // Trusts the server, but presents a certificate from an unknown CA
    let client = context("rogue.keystore.pem", "truststore.pem").client_config();

    let result = raw_get(client, server.addr, "/health").await;

    match result {
        Ok(response) => assert!(!response.contains("200"), "got: {response}"),
        Err(_) => {}
    }
    let stats = server.stats();
    wait_for(|| stats.failed_handshakes() == 1).await;
    assert_eq!(stats.handshakes(), 0);
}

#[tokio::test]
async fn client_rejects_untrusted_server() {
    let server = start_app_b(ClientAuthMode::Required).await;
    // Valid client certificate, but the server's CA is not trusted
    let client = context("app-a.keystore.pem", "rogue-truststore.pem").client_config();

    let err = raw_get(client, server.addr, "/health").await.unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);
}

#[tokio::test]
async fn optional_client_auth_accepts_anonymous_client() {
    let server = start_app_b(ClientAuthMode::Optional).await;
    let roots = peerlink_tls::Truststore::load(&cert("truststore.pem"), None)
        .unwrap()
        .into_roots();
    let provider = Arc::new(tokio_rustls::rustls::crypto::ring::default_provider());
    let anonymous = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_root_certificates(roots)
        .with_no_client_auth();

    let response = raw_get(anonymous, server.addr, "/health").await.unwrap();
    assert!(response.contains(r#"{"status":"UP","service":"app-b"}"#));
}

#[tokio::test]
async fn counts_one_handshake_per_connection() {
    let server = start_app_b(ClientAuthMode::Required).await;
    let client = context("app-a.keystore.pem", "truststore.pem").client_config();

    for _ in 0..3 {
        raw_get(client.clone(), server.addr, "/health").await.unwrap();
    }

    assert_eq!(server.stats().accepted(), 3);
    assert_eq!(server.stats().handshakes(), 3);
}

#[tokio::test]
async fn shutdown_stops_accepting() {
    let server = start_app_b(ClientAuthMode::Required).await;
    let addr = server.addr;
    server.shutdown().await;

    let client = context("app-a.keystore.pem", "truststore.pem").client_config();
    assert!(raw_get(client, addr, "/health").await.is_err());
}
