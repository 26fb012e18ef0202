//! End-to-end liveness tests
//!
//! Every test runs a real client over loopback, against either a gateway or a
//! server that never answers. Timing is shortened through `LivenessConfig`.
//!
//! Run with: cargo test -p integration-tests --test liveness_tests

use integration_tests::{
    eventually, fast_liveness, free_port, test_config, MuteServer, TestClient, TestGateway,
};
use serde_json::json;
use std::time::Duration;
use tether_client::{ClientError, Envelope, LinkState, CONNECTING_MESSAGE, LOST_MESSAGE};
use tether_common::{AppError, LivenessConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::sleep;

// ============================================================================
// Gateway Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let gateway = TestGateway::start().await.expect("Failed to start gateway");

    let mut stream = TcpStream::connect(gateway.addr).await.unwrap();
    stream
        .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.ends_with("OK"), "{response}");
}

#[tokio::test]
async fn test_gateway_reports_taken_port() {
    let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = occupied.local_addr().unwrap().port();
    let config = test_config(port, fast_liveness()).unwrap();

    let result = tether_gateway::run(config).await;
    assert!(matches!(result, Err(AppError::Bind { .. })), "{result:?}");
}

// ============================================================================
// Connection Tests
// ============================================================================

#[tokio::test]
async fn test_client_receives_init_and_opens() {
    let gateway = TestGateway::start().await.expect("Failed to start gateway");
    let endpoint = gateway.endpoint().unwrap();
    let mut client = TestClient::connect(&endpoint, fast_liveness(), &["Init"]);

    let init = client.next_envelope("Init").await.unwrap();
    assert_eq!(init.get("handle"), Some(&json!(1)));

    client.wait_for_state(LinkState::Open).await.unwrap();
    assert_eq!(client.connection.url(), format!("ws://{}/ws", gateway.addr));

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_ping_pong_keeps_link_alive() {
    let gateway = TestGateway::start().await.expect("Failed to start gateway");
    let endpoint = gateway.endpoint().unwrap();
    let mut client = TestClient::connect(&endpoint, fast_liveness(), &["Init"]);
    client.next_envelope("Init").await.unwrap();

    // Several ping cycles and one verify cycle
    sleep(Duration::from_millis(1_200)).await;

    assert_eq!(client.connection.state(), LinkState::Open);
    assert_eq!(gateway.hub.handles(), vec![1], "client reconnected");
    assert_eq!(client.status.message(), "");

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_envelopes_are_relayed_with_sender_handle() {
    let gateway = TestGateway::start().await.expect("Failed to start gateway");
    let endpoint = gateway.endpoint().unwrap();

    let mut alice = TestClient::connect(&endpoint, fast_liveness(), &["Init", "Note"]);
    let alice_handle = alice.next_envelope("Init").await.unwrap();
    let mut bob = TestClient::connect(&endpoint, fast_liveness(), &["Init", "Note"]);
    bob.next_envelope("Init").await.unwrap();

    alice
        .connection
        .send(Envelope::new("Note").with("text", "hello"))
        .unwrap();

    let note = bob.next_envelope("Note").await.unwrap();
    assert_eq!(note.get("text"), Some(&json!("hello")));
    assert_eq!(note.get("handle"), alice_handle.get("handle"));

    // The sender gets its own envelope back too
    let echo = alice.next_envelope("Note").await.unwrap();
    assert_eq!(echo, note);

    alice.shutdown().await.unwrap();
    bob.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_departure_is_broadcast() {
    let gateway = TestGateway::start().await.expect("Failed to start gateway");
    let endpoint = gateway.endpoint().unwrap();

    let mut stays = TestClient::connect(&endpoint, fast_liveness(), &["Init", "Close"]);
    stays.next_envelope("Init").await.unwrap();
    let mut leaves = TestClient::connect(&endpoint, fast_liveness(), &["Init"]);
    let leaving = leaves.next_envelope("Init").await.unwrap();

    leaves.shutdown().await.unwrap();

    let close = stays.next_envelope("Close").await.unwrap();
    assert_eq!(close.get("handle"), leaving.get("handle"));
    eventually("hub to drop the peer", || gateway.hub.len() == 1)
        .await
        .unwrap();

    stays.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unhandled_action_keeps_link_open() {
    let gateway = TestGateway::start().await.expect("Failed to start gateway");
    let endpoint = gateway.endpoint().unwrap();

    // No handler for Note, so the relayed envelope fails to dispatch
    let mut client = TestClient::connect(&endpoint, fast_liveness(), &["Init"]);
    client.next_envelope("Init").await.unwrap();

    client
        .connection
        .send(Envelope::new("Note").with("text", "unhandled"))
        .unwrap();

    eventually("handler failure status", || {
        client.status.message().starts_with("Socket action Note failed")
    })
    .await
    .unwrap();
    assert_eq!(client.connection.state(), LinkState::Open);
    assert_eq!(gateway.hub.handles(), vec![1]);

    client.shutdown().await.unwrap();
}

// ============================================================================
// Reconnect Tests
// ============================================================================

#[tokio::test]
async fn test_reconnects_once_gateway_comes_up() {
    let port = free_port().await.unwrap();
    let liveness = LivenessConfig {
        ping_interval_ms: 2_000,
        reconnect_delay_ms: 200,
        pong_timeout_ms: 400,
    };
    let endpoint = tether_client::Endpoint::new("127.0.0.1", port, false, "/ws").unwrap();
    let mut client = TestClient::connect(&endpoint, liveness, &["Init"]);

    // First verify has run against a closed port
    sleep(Duration::from_millis(500)).await;
    assert_ne!(client.connection.state(), LinkState::Open);
    assert_eq!(client.status.message(), CONNECTING_MESSAGE);

    let gateway = TestGateway::start_on(port).await.expect("Failed to start gateway");
    client.next_envelope("Init").await.unwrap();
    client.wait_for_state(LinkState::Open).await.unwrap();

    eventually("connecting status to clear", || client.status.message().is_empty())
        .await
        .unwrap();
    assert_eq!(gateway.hub.len(), 1);

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_secure_endpoint_against_plain_gateway_keeps_retrying() {
    let gateway = TestGateway::start().await.expect("Failed to start gateway");
    let liveness = LivenessConfig {
        ping_interval_ms: 2_000,
        reconnect_delay_ms: 200,
        pong_timeout_ms: 400,
    };
    let endpoint =
        tether_client::Endpoint::new("localhost", gateway.addr.port(), true, "/ws").unwrap();
    let client = TestClient::connect(&endpoint, liveness, &["Init"]);
    assert!(client.connection.url().starts_with("wss://"));

    // Failed TLS handshakes are reported, so the verify and retry cycle keeps running
    eventually("connecting status", || {
        client.status.message() == CONNECTING_MESSAGE
    })
    .await
    .unwrap();
    sleep(Duration::from_millis(500)).await;
    assert_ne!(client.connection.state(), LinkState::Open);
    assert!(gateway.hub.is_empty());

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_missing_pong_reports_lost_and_reconnects() {
    let server = MuteServer::start().await.unwrap();
    let liveness = LivenessConfig {
        ping_interval_ms: 200,
        reconnect_delay_ms: 5_000,
        pong_timeout_ms: 100,
    };
    let client = TestClient::connect(&server.endpoint().unwrap(), liveness, &[]);
    client.wait_for_state(LinkState::Open).await.unwrap();

    eventually("a second handshake", || server.accepted() >= 2)
        .await
        .unwrap();
    assert_eq!(client.status.message(), LOST_MESSAGE);

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_close_stops_all_activity() {
    let server = MuteServer::start().await.unwrap();
    let liveness = LivenessConfig {
        ping_interval_ms: 200,
        reconnect_delay_ms: 200,
        pong_timeout_ms: 100,
    };
    let client = TestClient::connect(&server.endpoint().unwrap(), liveness, &[]);
    client.wait_for_state(LinkState::Open).await.unwrap();

    client.connection.close().await.unwrap();
    // Let a handshake already on the wire land before counting
    sleep(Duration::from_millis(50)).await;
    let accepted = server.accepted();

    sleep(Duration::from_millis(800)).await;
    assert_eq!(server.accepted(), accepted);
    assert_eq!(client.connection.state(), LinkState::Closed);
    assert!(matches!(
        client.connection.send(json!({"action": "Note"})),
        Err(ClientError::Closed)
    ));

    // Closing twice is harmless
    client.shutdown().await.unwrap();
}
