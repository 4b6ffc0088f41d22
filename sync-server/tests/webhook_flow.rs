//! Webhook endpoints exercised through the full router

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use shared::message::SyncCommand;
use shared::order::ProfileId;
use sync_server::bus::CommandReceiver;
use sync_server::services::MemoryProfileRegistry;
use sync_server::{Config, ServerState, api};

struct TestServer {
    app: axum::Router,
    receiver: CommandReceiver,
    profile: ProfileId,
}

fn test_server() -> TestServer {
    let config = Config {
        http_port: 0,
        environment: "test".to_string(),
        market_base_url: "http://127.0.0.1:9".to_string(),
        request_timeout_ms: 1000,
        intake_interval_secs: 60,
        intake_window_hours: 24,
        retry_delay_secs: 60,
    };
    let (mut state, receiver, _changes) = ServerState::initialize(config).unwrap();

    let registry = Arc::new(MemoryProfileRegistry::new());
    let profile = ProfileId::new();
    registry.register(profile, "token");
    state.profiles = registry;

    TestServer {
        app: api::router().with_state(state),
        receiver,
        profile,
    }
}

async fn post(app: axum::Router, path: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn webhook_body(shipment: &str) -> Value {
    json!({"data": {"shipments": [{"shipmentId": shipment}]}})
}

#[tokio::test]
async fn new_order_webhook_dispatches_intake_and_replies_success() {
    let mut server = test_server();
    let path = format!("/megamarket/order/new/{}", server.profile);

    let (status, reply) = post(server.app, &path, webhook_body("M-946032218")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["success"], 1);

    match server.receiver.recv().await {
        Some(SyncCommand::Intake(cmd)) => {
            assert_eq!(cmd.shipment, "946032218");
            assert_eq!(cmd.profile, server.profile);
        }
        other => panic!("expected an intake command, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_profile_replies_failure_without_dispatching() {
    let mut server = test_server();
    let path = format!("/megamarket/order/new/{}", ProfileId::new());

    let (status, reply) = post(server.app, &path, webhook_body("946032218")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["success"], 0);

    // The router (and with it the bus senders) is gone; an empty closed
    // channel proves nothing was dispatched
    assert!(server.receiver.recv().await.is_none());
}

#[tokio::test]
async fn missing_shipment_id_replies_failure() {
    let server = test_server();
    let path = format!("/megamarket/order/new/{}", server.profile);

    let (_, reply) = post(server.app, &path, json!({"data": {"shipments": []}})).await;
    assert_eq!(reply["success"], 0);
}

#[tokio::test]
async fn cancellation_is_acknowledged_without_dispatching() {
    let mut server = test_server();
    let path = format!("/megamarket/order/cancel/{}", server.profile);

    let (status, reply) = post(server.app, &path, webhook_body("946032218")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["success"], 1);

    assert!(server.receiver.recv().await.is_none());
}
