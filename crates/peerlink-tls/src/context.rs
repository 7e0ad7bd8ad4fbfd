//! TLS context construction

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustls::crypto::CryptoProvider;
use rustls::server::WebPkiClientVerifier;
use rustls::{ClientConfig, ServerConfig};
use serde::Deserialize;

use crate::error::{Result, TlsConfigError};
use crate::secret::Secret;
use crate::store::{resource_path, Keystore, Truststore};

/// How the inbound server treats client certificates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientAuthMode {
    /// Handshakes without a trusted client certificate are rejected
    #[default]
    Required,
    /// Anonymous clients are allowed; presented certificates must still verify
    Optional,
}

/// What was loaded, for startup logging. Contains no key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialSummary {
    pub keystore: PathBuf,
    pub truststore: PathBuf,
    pub chain_len: usize,
    pub trust_anchors: usize,
    pub client_auth: ClientAuthMode,
}

/// Builder for [`TlsContext`]
#[derive(Debug, Default)]
pub struct TlsContextBuilder {
    keystore: Option<(PathBuf, Option<Secret>)>,
    truststore: Option<(PathBuf, Option<Secret>)>,
    client_auth: ClientAuthMode,
}

impl TlsContextBuilder {
    /// Keystore holding this instance's certificate chain and private key
    pub fn keystore(mut self, path: impl AsRef<Path>, password: Option<Secret>) -> Self {
        self.keystore = Some((resource_path(path.as_ref()), password));
        self
    }

    /// Truststore holding the CA anchors peers must chain to
    pub fn truststore(mut self, path: impl AsRef<Path>, password: Option<Secret>) -> Self {
        self.truststore = Some((resource_path(path.as_ref()), password));
        self
    }

    /// Client certificate policy for the server side (default: required)
    pub fn client_auth(mut self, mode: ClientAuthMode) -> Self {
        self.client_auth = mode;
        self
    }

    /// Load both stores and build client and server configurations.
    pub fn build(self) -> Result<TlsContext> {
        let (keystore_path, keystore_password) = self
            .keystore
            .ok_or(TlsConfigError::MissingStore("keystore"))?;
        let (truststore_path, truststore_password) = self
            .truststore
            .ok_or(TlsConfigError::MissingStore("truststore"))?;

        let keystore = Keystore::load(&keystore_path, keystore_password.as_ref())?;
        let truststore = Truststore::load(&truststore_path, truststore_password.as_ref())?;
        let trust_anchors = truststore.len();

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let roots = Arc::new(truststore.into_roots());

        let client = ClientConfig::builder_with_provider(provider.clone())
            .with_safe_default_protocol_versions()?
            .with_root_certificates(roots.clone())
            .with_client_auth_cert(keystore.chain.clone(), keystore.key.clone_key())?;

        let server = build_server_config(&keystore, roots, provider, self.client_auth)?;

        let summary = MaterialSummary {
            keystore: keystore_path,
            truststore: truststore_path,
            chain_len: keystore.chain.len(),
            trust_anchors,
            client_auth: self.client_auth,
        };

        tracing::debug!(
            keystore = %summary.keystore.display(),
            truststore = %summary.truststore.display(),
            chain_len = summary.chain_len,
            trust_anchors = summary.trust_anchors,
            "Built TLS context"
        );

        Ok(TlsContext {
            client: Arc::new(client),
            server: Arc::new(server),
            summary,
        })
    }
}

fn build_server_config(
    keystore: &Keystore,
    roots: Arc<rustls::RootCertStore>,
    provider: Arc<CryptoProvider>,
    client_auth: ClientAuthMode,
) -> Result<ServerConfig> {
    let verifier = WebPkiClientVerifier::builder_with_provider(roots, provider.clone());
    let verifier = match client_auth {
        ClientAuthMode::Required => verifier.build(),
        ClientAuthMode::Optional => verifier.allow_unauthenticated().build(),
    }
    .map_err(|e| TlsConfigError::ClientVerifier(e.to_string()))?;

    let mut config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_client_cert_verifier(verifier)
        .with_single_cert(keystore.chain.clone(), keystore.key.clone_key())?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(config)
}

/// Immutable mutual-TLS context, loaded once and shared for the process
/// lifetime. Cloning is cheap.
#[derive(Clone)]
pub struct TlsContext {
    client: Arc<ClientConfig>,
    server: Arc<ServerConfig>,
    summary: MaterialSummary,
}

impl TlsContext {
    pub fn builder() -> TlsContextBuilder {
        TlsContextBuilder::default()
    }

    /// Client configuration presenting our certificate and validating peers.
    ///
    /// Returned by value because HTTP client builders take ownership.
    pub fn client_config(&self) -> ClientConfig {
        self.client.as_ref().clone()
    }

    /// Server configuration for the inbound listener
    pub fn server_config(&self) -> Arc<ServerConfig> {
        self.server.clone()
    }

    pub fn summary(&self) -> &MaterialSummary {
        &self.summary
    }
}

impl fmt::Debug for TlsContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsContext")
            .field("summary", &self.summary)
            .finish_non_exhaustive()
    }
}
