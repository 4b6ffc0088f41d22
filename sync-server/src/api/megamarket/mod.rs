//! Marketplace webhook endpoints
//!
//! The marketplace expects an immediate `{"data":{},"meta":{},"success":1}`
//! envelope; real processing runs asynchronously off the command bus.
//! Failures here are only visible in logs, never to the caller.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use serde_json::Value;
use uuid::Uuid;

use shared::message::{OrderIntakeCommand, SyncCommand};
use shared::order::ProfileId;
use shared::response::MarketReply;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/megamarket/order/new/{profile}", post(order_new))
        .route("/megamarket/order/cancel/{profile}", post(order_cancel))
}

/// Shipment-creation notification
///
/// Extracts the first shipment id from `data.shipments` and dispatches
/// intake for the profile in the path.
async fn order_new(
    State(state): State<ServerState>,
    Path(profile): Path<String>,
    Json(body): Json<Value>,
) -> Json<MarketReply> {
    tracing::debug!(profile, body = %body, "New-order webhook received");

    let Some(profile) = resolve_profile(&state, &profile).await else {
        tracing::warn!(profile, "New-order webhook for unknown profile");
        return Json(MarketReply::fail());
    };

    let Some(shipment) = first_shipment_id(&body) else {
        tracing::warn!(profile = %profile, "New-order webhook without a shipment id");
        return Json(MarketReply::fail());
    };

    tracing::info!(shipment, profile = %profile, "New-order webhook accepted");
    state
        .bus
        .dispatch(SyncCommand::Intake(OrderIntakeCommand::new(&shipment, profile)));

    Json(MarketReply::ok())
}

/// Cancellation notification; acknowledged and logged, not acted on
async fn order_cancel(
    State(state): State<ServerState>,
    Path(profile): Path<String>,
    Json(body): Json<Value>,
) -> Json<MarketReply> {
    let Some(profile) = resolve_profile(&state, &profile).await else {
        tracing::warn!(profile, "Cancellation webhook for unknown profile");
        return Json(MarketReply::fail());
    };

    let shipment = first_shipment_id(&body).unwrap_or_default();
    tracing::info!(shipment, profile = %profile, "Cancellation webhook acknowledged");

    Json(MarketReply::ok())
}

/// The path segment must parse as a profile id AND be marketplace-connected
async fn resolve_profile(state: &ServerState, raw: &str) -> Option<ProfileId> {
    let profile = ProfileId(Uuid::parse_str(raw).ok()?);
    state.profiles.token(&profile).await.map(|_| profile)
}

/// `data.shipments[0].shipmentId` from the webhook body
fn first_shipment_id(body: &Value) -> Option<String> {
    let shipment = body.get("data")?.get("shipments")?.get(0)?;
    let id = shipment.get("shipmentId")?;
    match id {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_the_first_shipment_id() {
        let body = json!({"data": {"shipments": [
            {"shipmentId": "9324005526611"},
            {"shipmentId": "other"}
        ]}});
        assert_eq!(first_shipment_id(&body).as_deref(), Some("9324005526611"));

        let numeric = json!({"data": {"shipments": [{"shipmentId": 946032218}]}});
        assert_eq!(first_shipment_id(&numeric).as_deref(), Some("946032218"));

        assert!(first_shipment_id(&json!({})).is_none());
        assert!(first_shipment_id(&json!({"data": {"shipments": []}})).is_none());
    }
}
