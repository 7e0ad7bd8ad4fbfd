//! TOML configuration for the daemon
//!
//! ```toml
//! [service]
//! name = "app-a"
//!
//! [tls]
//! keystore = "/etc/peerlink/app-a.keystore.pem"
//! truststore = "/etc/peerlink/truststore.pem"
//!
//! [peer]
//! name = "app-b"
//! ```
//!
//! Everything else has a default. See `config/app-a.toml` for the full set.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use peerlink_client::ClientSettings;
use peerlink_core::{InstanceIdentity, PeerIdentity};
use peerlink_tls::{ClientAuthMode, Secret};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A value is present but unusable
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Top-level daemon configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    pub service: ServiceConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub tls: TlsConfig,
    pub peer: PeerConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

/// This instance
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Service name, e.g. `app-a`
    pub name: String,
    /// Human-readable name, derived from `name` when absent
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Inbound listener
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    #[serde(default)]
    pub client_auth: ClientAuthMode,
}

/// Keystore and truststore locations
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TlsConfig {
    /// PEM file with certificate chain and private key. `file:` prefix allowed.
    pub keystore: PathBuf,
    /// Decrypts an `ENCRYPTED PRIVATE KEY` block in the keystore
    #[serde(default)]
    pub keystore_password: Option<Secret>,
    /// PEM file with CA certificates. `file:` prefix allowed.
    pub truststore: PathBuf,
    /// Accepted for compatibility with password-protected store formats; PEM
    /// truststores are not encrypted
    #[serde(default)]
    pub truststore_password: Option<Secret>,
}

/// The peer instance and how to call it
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PeerConfig {
    /// Peer service name, e.g. `app-b`
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Base URL, defaults to the in-cluster DNS name on port 8443
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,
    #[serde(default = "default_pool_idle_timeout_secs")]
    pub pool_idle_timeout_secs: u64,
    #[serde(default = "default_max_connections_per_host")]
    pub max_connections_per_host: usize,
}

/// Certificate listing at startup
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiagnosticsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// External tool used to list certificates
    #[serde(default = "default_tool")]
    pub tool: String,
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], peerlink_core::DEFAULT_PEER_PORT))
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_pool_max_idle_per_host() -> usize {
    4
}

fn default_pool_idle_timeout_secs() -> u64 {
    90
}

fn default_max_connections_per_host() -> usize {
    32
}

fn default_true() -> bool {
    true
}

fn default_tool() -> String {
    "openssl".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            client_auth: ClientAuthMode::default(),
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tool: default_tool(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check values that parse but cannot work
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service.name.trim().is_empty() {
            return Err(ConfigError::invalid("service.name", "must not be empty"));
        }
        if self.peer.name.trim().is_empty() {
            return Err(ConfigError::invalid("peer.name", "must not be empty"));
        }
        if self.peer.name == self.service.name {
            return Err(ConfigError::invalid(
                "peer.name",
                format!("'{}' is this instance's own name", self.peer.name),
            ));
        }

        let peer_url = self.peer.base_url();
        let url = Url::parse(&peer_url)
            .map_err(|e| ConfigError::invalid("peer.url", format!("'{peer_url}': {e}")))?;
        if url.scheme() != "https" {
            return Err(ConfigError::invalid(
                "peer.url",
                format!("'{peer_url}' must use https"),
            ));
        }
        if url.host_str().is_none() {
            return Err(ConfigError::invalid("peer.url", format!("'{peer_url}' has no host")));
        }

        let nonzero = [
            ("peer.timeout_ms", self.peer.timeout_ms),
            ("peer.connect_timeout_ms", self.peer.connect_timeout_ms),
            ("peer.pool_idle_timeout_secs", self.peer.pool_idle_timeout_secs),
            (
                "peer.max_connections_per_host",
                self.peer.max_connections_per_host as u64,
            ),
        ];
        for (field, value) in nonzero {
            if value == 0 {
                return Err(ConfigError::invalid(field, "must be greater than zero"));
            }
        }

        if self.diagnostics.enabled && self.diagnostics.tool.trim().is_empty() {
            return Err(ConfigError::invalid("diagnostics.tool", "must not be empty"));
        }

        Ok(())
    }
}

impl ServiceConfig {
    pub fn identity(&self) -> InstanceIdentity {
        let identity = InstanceIdentity::new(self.name.clone());
        match &self.display_name {
            Some(display_name) => identity.with_display_name(display_name.clone()),
            None => identity,
        }
    }
}

impl PeerConfig {
    /// Configured URL, or the in-cluster default for the peer's name
    pub fn base_url(&self) -> String {
        self.url
            .clone()
            .unwrap_or_else(|| PeerIdentity::default_base_url(&self.name))
    }

    pub fn identity(&self) -> PeerIdentity {
        let identity = PeerIdentity::new(self.name.clone()).with_base_url(self.base_url());
        match &self.display_name {
            Some(display_name) => identity.with_display_name(display_name.clone()),
            None => identity,
        }
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            timeout: Duration::from_millis(self.timeout_ms),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            pool_max_idle_per_host: self.pool_max_idle_per_host,
            pool_idle_timeout: Duration::from_secs(self.pool_idle_timeout_secs),
            max_connections_per_host: self.max_connections_per_host,
        }
    }
}
