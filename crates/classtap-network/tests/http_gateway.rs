//! Integration tests for HttpGateway
//!
//! These tests run the gateway against an httpmock server to verify the
//! request shape, status handling and timeout behavior.

use std::time::Duration;

use classtap_core::RoomId;
use classtap_network::{GatewayError, HttpGateway, HttpGatewayConfig, SubmissionGateway};
use httpmock::prelude::*;
use serde_json::json;

fn gateway_for(server: &MockServer, timeout: Duration) -> HttpGateway {
    HttpGateway::new(HttpGatewayConfig {
        base_url: server.base_url(),
        timeout,
    })
    .unwrap()
}

#[tokio::test]
async fn test_submit_posts_json_room_entry_request() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/RoomEntryRequest/CreateRequest")
                .header("content-type", "application/json")
                .json_body(json!({"nfcId": "F1E2D3C4B5A697", "roomId": 12}));
            then.status(200).body("created");
        })
        .await;

    let gateway = gateway_for(&server, Duration::from_secs(5));
    let receipt = gateway
        .submit("F1E2D3C4B5A697", RoomId::new(12).unwrap())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(receipt.status_code, 200);
    assert_eq!(receipt.body, "created");
    assert!(receipt.is_delivered());
}

#[tokio::test]
async fn test_non_200_status_is_returned_not_raised() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/RoomEntryRequest/CreateRequest");
            then.status(400).body("Unknown card");
        })
        .await;

    let gateway = gateway_for(&server, Duration::from_secs(5));
    let receipt = gateway
        .submit("04A1B2C3", RoomId::new(3).unwrap())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(receipt.status_code, 400);
    assert_eq!(receipt.body, "Unknown card");
    assert!(!receipt.is_delivered());
}

#[tokio::test]
async fn test_submit_is_not_retried_on_server_error() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/RoomEntryRequest/CreateRequest");
            then.status(500);
        })
        .await;

    let gateway = gateway_for(&server, Duration::from_secs(5));
    let receipt = gateway
        .submit("04A1B2C3", RoomId::new(3).unwrap())
        .await
        .unwrap();

    assert_eq!(receipt.status_code, 500);
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/RoomEntryRequest/CreateRequest");
            then.status(200).delay(Duration::from_millis(500));
        })
        .await;

    let gateway = gateway_for(&server, Duration::from_millis(50));
    let result = gateway.submit("04A1B2C3", RoomId::new(3).unwrap()).await;

    assert!(matches!(result, Err(GatewayError::Timeout(50))));
}

#[tokio::test]
async fn test_unreachable_backend_is_request_error() {
    // Bind and drop a listener to get a port with nothing behind it
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let gateway = HttpGateway::new(HttpGatewayConfig {
        base_url: format!("http://{addr}"),
        timeout: Duration::from_secs(1),
    })
    .unwrap();

    let result = gateway.submit("04A1B2C3", RoomId::new(3).unwrap()).await;
    assert!(matches!(result, Err(GatewayError::Request(_))));
}
