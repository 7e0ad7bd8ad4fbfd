//! Response payloads served by a peerlink instance

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Status reported by a live instance
pub const STATUS_UP: &str = "UP";

/// Relayed when the peer answered without a usable `message`
pub const NO_RESPONSE: &str = "No response";

/// Body of `GET /api/greet`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreetingResponse {
    pub message: String,
    pub service: String,
}

/// Body of `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

impl HealthResponse {
    pub fn up(service: impl Into<String>) -> Self {
        Self {
            status: STATUS_UP.to_string(),
            service: service.into(),
        }
    }
}

/// Body of `GET /api/call-<peer>`.
///
/// Serializes as a two-key object whose second key depends on the peer:
/// `{"from":"app-a","app-b-response":"Hello from App B"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyResponse {
    /// This instance's service name
    pub from: String,
    /// Key for the relayed value, `<peer>-response`
    pub response_key: String,
    /// The peer's message, or an error description
    pub response: String,
}

impl ProxyResponse {
    pub fn new(
        from: impl Into<String>,
        response_key: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            response_key: response_key.into(),
            response: response.into(),
        }
    }
}

impl Serialize for ProxyResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("from", &self.from)?;
        map.serialize_entry(&self.response_key, &self.response)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn health_serializes_in_field_order() {
        let body = serde_json::to_string(&HealthResponse::up("app-a")).unwrap();
        assert_eq!(body, r#"{"status":"UP","service":"app-a"}"#);
    }

    #[test]
    fn greeting_serializes_in_field_order() {
        let greeting = GreetingResponse {
            message: "Hello from App A".to_string(),
            service: "app-a".to_string(),
        };
        let body = serde_json::to_string(&greeting).unwrap();
        assert_eq!(body, r#"{"message":"Hello from App A","service":"app-a"}"#);
    }

    #[test]
    fn proxy_response_uses_peer_key() {
        let response = ProxyResponse::new("app-a", "app-b-response", "Hello from App B");
        let body = serde_json::to_string(&response).unwrap();
        assert_eq!(
            body,
            r#"{"from":"app-a","app-b-response":"Hello from App B"}"#
        );
    }

    #[test]
    fn proxy_response_escapes_error_text() {
        let response = ProxyResponse::new("app-b", "app-a-response", "Error calling App A: \"x\"");
        let value: serde_json::Value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["app-a-response"], "Error calling App A: \"x\"");
        assert_eq!(value.as_object().unwrap().len(), 2);
    }
}
