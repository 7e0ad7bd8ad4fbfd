//! Command-line arguments and environment overrides

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use peerlink_tls::Secret;

use crate::config::{ConfigError, DaemonConfig};

/// peerlink daemon
#[derive(Debug, Parser)]
#[command(name = "peerlinkd")]
#[command(author, version, about = "Mutual-TLS peer service")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "PEERLINK_CONFIG")]
    pub config: PathBuf,

    /// Listen address, overrides [server].bind
    #[arg(long, env = "PEERLINK_BIND")]
    pub bind: Option<SocketAddr>,

    /// Peer base URL, overrides [peer].url
    #[arg(long, env = "PEERLINK_PEER_URL")]
    pub peer_url: Option<String>,

    /// Keystore path, overrides [tls].keystore
    #[arg(long, env = "PEERLINK_KEYSTORE")]
    pub keystore: Option<PathBuf>,

    /// Keystore password, overrides [tls].keystore_password
    #[arg(long, env = "PEERLINK_KEYSTORE_PASSWORD", hide_env_values = true)]
    pub keystore_password: Option<Secret>,

    /// Truststore path, overrides [tls].truststore
    #[arg(long, env = "PEERLINK_TRUSTSTORE")]
    pub truststore: Option<PathBuf>,

    /// Truststore password, overrides [tls].truststore_password
    #[arg(long, env = "PEERLINK_TRUSTSTORE_PASSWORD", hide_env_values = true)]
    pub truststore_password: Option<Secret>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

impl Cli {
    /// Load the config file and apply overrides from flags and environment
    pub fn load_config(&self) -> Result<DaemonConfig, ConfigError> {
        let mut config = DaemonConfig::load(&self.config)?;
        self.apply_overrides(&mut config);
        Ok(config)
    }

    /// Merge CLI arguments over config file values
    pub fn apply_overrides(&self, config: &mut DaemonConfig) {
        if let Some(bind) = self.bind {
            config.server.bind = bind;
        }
        if let Some(url) = &self.peer_url {
            config.peer.url = Some(url.clone());
        }
        if let Some(path) = &self.keystore {
            config.tls.keystore = path.clone();
        }
        if let Some(password) = &self.keystore_password {
            config.tls.keystore_password = Some(password.clone());
        }
        if let Some(path) = &self.truststore {
            config.tls.truststore = path.clone();
        }
        if let Some(password) = &self.truststore_password {
            config.tls.truststore_password = Some(password.clone());
        }
    }
}
