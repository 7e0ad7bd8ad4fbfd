//! Peer failures surface as strings inside a 200 response

use peerlink_tests::{caller, closed_port, get_json, instance_config, reserve, Instance};

#[tokio::test]
async fn unreachable_peer_yields_error_string() {
    let (listener, _) = reserve().await;
    let a = Instance::start(
        instance_config("app-a", "app-a.keystore.pem", "app-b", closed_port()),
        listener,
    );

    let json = get_json(&caller(), &a.url("/api/call-app-b")).await;

    assert_eq!(json["from"], "app-a");
    let response = json["app-b-response"].as_str().unwrap();
    assert!(response.starts_with("Error calling App B: "), "got: {response}");
}

#[tokio::test]
async fn health_is_independent_of_peer() {
    let (listener, _) = reserve().await;
    let a = Instance::start(
        instance_config("app-a", "app-a.keystore.pem", "app-b", closed_port()),
        listener,
    );

    let json = get_json(&caller(), &a.url("/health")).await;
    assert_eq!(json["status"], "UP");
    assert_eq!(json["service"], "app-a");
}

#[tokio::test]
async fn untrusted_peer_is_not_relayed() {
    let (listener_a, _) = reserve().await;
    let (listener_b, port_b) = reserve().await;

    // B presents a certificate from a CA that A does not trust
    let a = Instance::start(
        instance_config("app-a", "app-a.keystore.pem", "app-b", port_b),
        listener_a,
    );
    let _rogue = Instance::start(
        instance_config("app-b", "rogue.keystore.pem", "app-a", closed_port()),
        listener_b,
    );

    let json = get_json(&caller(), &a.url("/api/call-app-b")).await;
    let response = json["app-b-response"].as_str().unwrap();
    assert!(
        response.starts_with("Error calling App B: TLS validation failed"),
        "got: {response}"
    );
}

#[tokio::test]
async fn peer_failure_does_not_poison_later_calls() {
    let (listener_a, _) = reserve().await;
    let (listener_b, port_b) = reserve().await;
    let a = Instance::start(
        instance_config("app-a", "app-a.keystore.pem", "app-b", port_b),
        listener_a,
    );
    let client = caller();

    // Port reserved but nobody accepting yet: B is down
    drop(listener_b);
    let down = get_json(&client, &a.url("/api/call-app-b")).await;
    assert!(down["app-b-response"]
        .as_str()
        .unwrap()
        .starts_with("Error calling App B: "));

    // B comes up on the same port
    let listener_b = tokio::net::TcpListener::bind(("127.0.0.1", port_b))
        .await
        .unwrap();
    let _b = Instance::start(
        instance_config("app-b", "app-b.keystore.pem", "app-a", closed_port()),
        listener_b,
    );
    let up = get_json(&client, &a.url("/api/call-app-b")).await;
    assert_eq!(up["app-b-response"], "Hello from App B");
}
