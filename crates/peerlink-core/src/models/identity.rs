//! Instance and peer identities

use serde::{Deserialize, Serialize};

use super::response::{GreetingResponse, HealthResponse};

/// Port peers listen on inside the cluster
pub const DEFAULT_PEER_PORT: u16 = 8443;

/// Derive a human-readable name from a service name.
///
/// Each `-`/`_` separated word is capitalised: `app-a` becomes `App A`.
pub fn display_name_for(service_name: &str) -> String {
    service_name
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Identity of this instance. Set once at startup and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceIdentity {
    /// Machine name, e.g. `app-a`
    pub service_name: String,
    /// Name used in greetings, e.g. `App A`
    pub display_name: String,
}

impl InstanceIdentity {
    /// Create an identity whose display name is derived from the service name
    pub fn new(service_name: impl Into<String>) -> Self {
        let service_name = service_name.into();
        let display_name = display_name_for(&service_name);
        Self {
            service_name,
            display_name,
        }
    }

    /// Override the derived display name
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// The greeting this instance hands out on `/api/greet`
    pub fn greeting(&self) -> GreetingResponse {
        GreetingResponse {
            message: format!("Hello from {}", self.display_name),
            service: self.service_name.clone(),
        }
    }

    /// The liveness payload served on `/health`
    pub fn health(&self) -> HealthResponse {
        HealthResponse::up(&self.service_name)
    }
}

/// Identity and location of the peer instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerIdentity {
    /// Machine name, e.g. `app-b`
    pub name: String,
    /// Name used in error messages, e.g. `App B`
    pub display_name: String,
    /// Base URL of the peer, e.g. `https://app-b.default.svc.cluster.local:8443`
    pub base_url: String,
}

impl PeerIdentity {
    /// Create a peer identity with the in-cluster default base URL
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: display_name_for(&name),
            base_url: Self::default_base_url(&name),
            name,
        }
    }

    /// Override the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the derived display name
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Well-known in-cluster DNS name for a peer service
    pub fn default_base_url(name: &str) -> String {
        format!("https://{name}.default.svc.cluster.local:{DEFAULT_PEER_PORT}")
    }

    /// Route on this instance that proxies to the peer, e.g. `/api/call-app-b`
    pub fn proxy_path(&self) -> String {
        format!("/api/call-{}", self.name)
    }

    /// Key under which the peer's answer is relayed, e.g. `app-b-response`
    pub fn response_key(&self) -> String {
        format!("{}-response", self.name)
    }

    /// URL of the peer's greeting endpoint.
    ///
    /// The path is appended to the configured base, so a base URL with a
    /// path prefix keeps it.
    pub fn greet_url(&self) -> String {
        format!("{}/api/greet", self.base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_name_capitalises_words() {
        assert_eq!(display_name_for("app-a"), "App A");
        assert_eq!(display_name_for("billing_service"), "Billing Service");
        assert_eq!(display_name_for("app--b"), "App B");
    }

    #[test]
    fn display_name_of_empty_name() {
        assert_eq!(display_name_for(""), "");
    }

    #[test]
    fn instance_greeting_uses_display_name() {
        let identity = InstanceIdentity::new("app-a");
        let greeting = identity.greeting();
        assert_eq!(greeting.message, "Hello from App A");
        assert_eq!(greeting.service, "app-a");
    }

    #[test]
    fn instance_display_name_override() {
        let identity = InstanceIdentity::new("app-a").with_display_name("Alpha");
        assert_eq!(identity.greeting().message, "Hello from Alpha");
    }

    #[test]
    fn peer_defaults_to_cluster_dns() {
        let peer = PeerIdentity::new("app-b");
        assert_eq!(peer.base_url, "https://app-b.default.svc.cluster.local:8443");
        assert_eq!(peer.display_name, "App B");
    }

    #[test]
    fn peer_routes() {
        let peer = PeerIdentity::new("app-b");
        assert_eq!(peer.proxy_path(), "/api/call-app-b");
        assert_eq!(peer.response_key(), "app-b-response");
    }

    #[test]
    fn greet_url_trims_trailing_slash() {
        let peer = PeerIdentity::new("app-b").with_base_url("https://localhost:9443/");
        assert_eq!(peer.greet_url(), "https://localhost:9443/api/greet");
    }

    #[test]
    fn greet_url_keeps_path_prefix() {
        let peer = PeerIdentity::new("app-b").with_base_url("https://gateway/b");
        assert_eq!(peer.greet_url(), "https://gateway/b/api/greet");
    }
}
