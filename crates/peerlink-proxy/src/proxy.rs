//! PeerProxyClient - PeerGreeter that calls the peer over mutual TLS

use async_trait::async_trait;
use peerlink_client::{ClientError, MtlsClient};
use peerlink_core::{PeerGreeter, PeerIdentity, NO_RESPONSE};
use serde_json::Value;
use url::Url;

/// Calls one peer's greeting endpoint.
///
/// Holds a clone of the process-wide [`MtlsClient`], so all proxy requests
/// share one connection pool.
#[derive(Debug, Clone)]
pub struct PeerProxyClient {
    client: MtlsClient,
    peer: PeerIdentity,
    greet_url: Url,
}

impl PeerProxyClient {
    /// Create a proxy client for `peer`.
    ///
    /// Fails if the peer's base URL does not form a valid https URL.
    pub fn new(client: MtlsClient, peer: PeerIdentity) -> Result<Self, ClientError> {
        let greet_url = Url::parse(&peer.greet_url())?;
        if greet_url.scheme() != "https" {
            return Err(ClientError::InsecureUrl(greet_url.to_string()));
        }

        Ok(Self {
            client,
            peer,
            greet_url,
        })
    }

    /// Target of every call
    pub fn greet_url(&self) -> &Url {
        &self.greet_url
    }

    async fn call(&self) -> Result<String, ClientError> {
        let body = self.client.get(&self.greet_url).await?;
        extract_message(&body)
    }
}

#[async_trait]
impl PeerGreeter for PeerProxyClient {
    fn peer(&self) -> &PeerIdentity {
        &self.peer
    }

    async fn fetch_peer_greeting(&self) -> String {
        let peer = &self.peer.display_name;
        tracing::info!("Calling {} at: {}", peer, self.greet_url);

        match self.call().await {
            Ok(message) => {
                tracing::info!(%message, "Received response from {}", peer);
                message
            }
            Err(e) => {
                tracing::error!(error = %e, url = %self.greet_url, "Error calling {}", peer);
                format!("Error calling {}: {}", peer, e)
            }
        }
    }
}

/// Pull `message` out of a greeting body.
///
/// A body that is not JSON is an error. A body that is JSON but carries no
/// string `message` (empty, `null`, an array, an object without the field)
/// yields [`NO_RESPONSE`].
fn extract_message(body: &[u8]) -> Result<String, ClientError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(NO_RESPONSE.to_string());
    }

    let value: Value =
        serde_json::from_slice(body).map_err(|e| ClientError::Malformed(e.to_string()))?;

    Ok(match value.get("message") {
        Some(Value::String(message)) => message.clone(),
        _ => NO_RESPONSE.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extracts_message_field() {
        let body = br#"{"message":"Hello from App B","service":"app-b"}"#;
        assert_eq!(extract_message(body).unwrap(), "Hello from App B");
    }

    #[test]
    fn ignores_extra_fields() {
        let body = br#"{"service":"app-b","message":"hi","version":3}"#;
        assert_eq!(extract_message(body).unwrap(), "hi");
    }

    #[test]
    fn empty_body_is_no_response() {
        assert_eq!(extract_message(b"").unwrap(), NO_RESPONSE);
        assert_eq!(extract_message(b"  \n").unwrap(), NO_RESPONSE);
    }

    #[test]
    fn json_without_message_is_no_response() {
        for body in [
            &b"null"[..],
            br#"{"service":"app-b"}"#,
            br#"{"message":null}"#,
            br#"{"message":42}"#,
            br#"["message"]"#,
            br#""message""#,
        ] {
            assert_eq!(extract_message(body).unwrap(), NO_RESPONSE);
        }
    }

    #[test]
    fn invalid_json_is_malformed() {
        let err = extract_message(b"<html>oops</html>").unwrap_err();
        assert!(matches!(err, ClientError::Malformed(_)));
        assert!(err.to_string().starts_with("malformed response: "));
    }

    #[test]
    fn rejects_plaintext_peer_url() {
        let peer = PeerIdentity::new("app-b").with_base_url("http://app-b:8080");

        let err = PeerProxyClient::new(client(), peer).unwrap_err();
        assert!(matches!(err, ClientError::InsecureUrl(_)));
    }

    #[test]
    fn builds_greet_url_from_base() {
        let peer = PeerIdentity::new("app-b").with_base_url("https://app-b:8443/");

        let proxy = PeerProxyClient::new(client(), peer).unwrap();
        assert_eq!(proxy.greet_url().as_str(), "https://app-b:8443/api/greet");
    }

    fn client() -> MtlsClient {
        let tls = peerlink_tls::TlsContext::builder()
            .keystore(fixture("app-a.keystore.pem"), None)
            .truststore(fixture("truststore.pem"), None)
            .build()
            .unwrap();
        MtlsClient::new(tls.client_config()).unwrap()
    }

    fn fixture(name: &str) -> std::path::PathBuf {
        std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../testdata/certs")
            .join(name)
    }
}
