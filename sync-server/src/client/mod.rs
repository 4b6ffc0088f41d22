//! Megamarket order-service client
//!
//! Wraps the four remote operations the sync pipeline needs: fetch one
//! order, list new orders, acknowledge packaging, acknowledge handover.
//! The marketplace signals business failures inside HTTP 200 envelopes
//! (`success != 1` on reads, an `error` key on acknowledgements), so the
//! client owns envelope classification and a bounded in-client retry for
//! acknowledgements. Transport failures never escape as errors — callers
//! get a variant result and decide on queue-level redelivery.

mod request;
mod transport;

pub use transport::{HttpTransport, MarketResponse, MarketTransport};

use dashmap::DashMap;
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::time::{Duration, Instant};

use shared::error::AppError;
use shared::market::{HandoverItem, PackagingItem, RemoteOrder, strip_order_prefix};
use shared::order::ProfileId;
use shared::AppResult;

use crate::services::ProfileRegistry;

const ORDER_GET: &str = "/api/market/v1/orderService/order/get";
const ORDER_SEARCH: &str = "/api/market/v1/orderService/order/search";
const ORDER_PACKING: &str = "/api/market/v1/orderService/order/packing";
const ORDER_CLOSE: &str = "/api/market/v1/orderService/order/close";

/// Bounded attempt count for acknowledgement business errors
const ACK_ATTEMPTS: u32 = 6;

/// Fetched orders may be reused for up to a week; workers that decide on
/// current status use the fresh path instead
const ORDER_CACHE_TTL: Duration = Duration::from_secs(7 * 24 * 3600);

#[derive(Debug, Deserialize)]
struct ShipmentsData {
    #[serde(default)]
    shipments: Vec<Value>,
}

pub struct MegamarketClient {
    transport: Arc<dyn MarketTransport>,
    profiles: Arc<dyn ProfileRegistry>,
    /// Acknowledgements only execute against the real backend in production
    execute_live: bool,
    cache: DashMap<String, (Instant, RemoteOrder)>,
}

impl MegamarketClient {
    pub fn new(
        transport: Arc<dyn MarketTransport>,
        profiles: Arc<dyn ProfileRegistry>,
        execute_live: bool,
    ) -> Self {
        Self {
            transport,
            profiles,
            execute_live,
            cache: DashMap::new(),
        }
    }

    /// Look up one order, serving a cached copy when available
    ///
    /// Accepts a bare shipment id or an `M-` prefixed local number; both
    /// resolve identically. Any failure (non-200, failed envelope, empty
    /// shipment list, transport error) is logged and yields `None`.
    pub async fn fetch_order(&self, profile: &ProfileId, order: &str) -> Option<RemoteOrder> {
        let shipment = strip_order_prefix(order);

        if let Some(entry) = self.cache.get(shipment) {
            let (fetched, order) = entry.value();
            if fetched.elapsed() < ORDER_CACHE_TTL {
                return Some(order.clone());
            }
        }

        // Evict the expired copy; a failed refetch must not leave it behind
        self.cache
            .remove_if(shipment, |_, (fetched, _)| fetched.elapsed() >= ORDER_CACHE_TTL);

        self.fetch_order_fresh(profile, order).await
    }

    /// Look up one order, bypassing and refreshing the cache
    pub async fn fetch_order_fresh(&self, profile: &ProfileId, order: &str) -> Option<RemoteOrder> {
        let shipment = strip_order_prefix(order);
        let token = self.token(profile).await?;

        let body = request::order_get_body(&token, shipment);
        let response = match self.transport.send(Method::GET, ORDER_GET, &body).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(order = shipment, "Order lookup failed: {e}");
                return None;
            }
        };

        // success may be absent on this path; only an explicit non-1 fails
        let success = response.body.get("success").and_then(Value::as_i64);
        if response.status != 200 || matches!(success, Some(s) if s != 1) {
            tracing::error!(
                order = shipment,
                status = response.status,
                "Order lookup rejected: {}",
                truncated_error(&response.body),
            );
            return None;
        }

        let order = first_shipment(&response.body)?;
        self.cache
            .insert(shipment.to_string(), (Instant::now(), order.clone()));
        Some(order)
    }

    /// List orders in `NEW` status created within the trailing window
    ///
    /// Empty result and failure are indistinguishable on purpose: intake
    /// treats both as "nothing to do" and the next tick tries again.
    pub async fn list_new_orders(
        &self,
        profile: &ProfileId,
        window: chrono::Duration,
    ) -> Vec<RemoteOrder> {
        let Some(token) = self.token(profile).await else {
            return Vec::new();
        };

        let to = chrono::Utc::now();
        let body = request::order_search_body(&token, to - window, to);
        let response = match self.transport.send(Method::GET, ORDER_SEARCH, &body).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(profile = %profile, "New-order search failed: {e}");
                return Vec::new();
            }
        };

        let success = response.body.get("success").and_then(Value::as_i64);
        if response.status != 200 || success != Some(1) {
            tracing::warn!(
                profile = %profile,
                status = response.status,
                "New-order search rejected: {}",
                truncated_error(&response.body),
            );
            return Vec::new();
        }

        all_shipments(&response.body)
    }

    /// Notify that the order is counted, boxed, and ready for handover
    ///
    /// `Err` marks a caller bug (empty items) and is never retried;
    /// `Ok(false)` is a remote failure the caller may redeliver on.
    pub async fn acknowledge_packaging(
        &self,
        profile: &ProfileId,
        order: &str,
        items: &[PackagingItem],
    ) -> AppResult<bool> {
        if items.is_empty() {
            return Err(AppError::validation("packaging items must not be empty"));
        }

        let shipment = strip_order_prefix(order);

        if !self.execute_live {
            tracing::warn!(order = shipment, "Packing acknowledgement skipped outside production");
            return Ok(true);
        }

        let Some(token) = self.token(profile).await else {
            return Ok(false);
        };
        let body = request::order_packing_body(&token, shipment, items);
        Ok(self.send_acknowledgement(ORDER_PACKING, shipment, &body).await)
    }

    /// Notify that physical handover happened; close date is "now"
    ///
    /// Every item must assert `handover_result == true` — violations are a
    /// caller bug and fail before any network call.
    pub async fn acknowledge_handover(
        &self,
        profile: &ProfileId,
        order: &str,
        items: &[HandoverItem],
    ) -> AppResult<bool> {
        if items.is_empty() {
            return Err(AppError::validation("handover items must not be empty"));
        }
        if items.iter().any(|item| !item.handover_result) {
            return Err(AppError::validation(
                "every handover item must carry handover_result = true",
            ));
        }

        let shipment = strip_order_prefix(order);

        if !self.execute_live {
            tracing::warn!(order = shipment, "Close acknowledgement skipped outside production");
            return Ok(true);
        }

        let Some(token) = self.token(profile).await else {
            return Ok(false);
        };
        let body = request::order_close_body(&token, shipment, chrono::Utc::now(), items);
        Ok(self.send_acknowledgement(ORDER_CLOSE, shipment, &body).await)
    }

    /// Send an acknowledgement, retrying business errors with escalating
    /// delays (1s, 2s, 4s, 8s, 16s) up to [`ACK_ATTEMPTS`] attempts
    ///
    /// The endpoint answers HTTP 200 even on failure; an `error` key in
    /// the envelope is the only failure signal. Transport errors fail
    /// immediately — the queue-level redelivery handles those.
    async fn send_acknowledgement(&self, path: &str, order: &str, body: &Value) -> bool {
        for attempt in 0..ACK_ATTEMPTS {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_secs(1 << (attempt - 1))).await;
            }

            let response = match self.transport.send(Method::GET, path, body).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(order, path, "Acknowledgement transport failure: {e}");
                    return false;
                }
            };

            match response.body.get("error") {
                None => return true,
                Some(error) => {
                    if attempt + 1 == ACK_ATTEMPTS {
                        tracing::error!(
                            order,
                            path,
                            attempts = ACK_ATTEMPTS,
                            "Acknowledgement failed: {}",
                            truncated_value(error),
                        );
                        return false;
                    }
                    tracing::warn!(
                        order,
                        attempt = attempt + 1,
                        "Acknowledgement rejected, retrying: {}",
                        truncated_value(error),
                    );
                }
            }
        }

        false
    }

    async fn token(&self, profile: &ProfileId) -> Option<String> {
        let token = self.profiles.token(profile).await;
        if token.is_none() {
            tracing::error!(profile = %profile, "No marketplace token registered for profile");
        }
        token
    }
}

fn parse_shipments(body: &Value) -> Vec<Value> {
    body.get("data")
        .cloned()
        .and_then(|data| serde_json::from_value::<ShipmentsData>(data).ok())
        .map(|data| data.shipments)
        .unwrap_or_default()
}

/// A search response may list full shipment objects or bare shipment ids
fn shipment_from_value(value: Value) -> Option<RemoteOrder> {
    match value {
        Value::Object(_) => match serde_json::from_value(value) {
            Ok(order) => Some(order),
            Err(e) => {
                tracing::warn!("Unparseable shipment in response: {e}");
                None
            }
        },
        id @ (Value::String(_) | Value::Number(_)) => {
            serde_json::from_value(serde_json::json!({ "shipmentId": id })).ok()
        }
        _ => None,
    }
}

fn first_shipment(body: &Value) -> Option<RemoteOrder> {
    parse_shipments(body).into_iter().next().and_then(shipment_from_value)
}

fn all_shipments(body: &Value) -> Vec<RemoteOrder> {
    parse_shipments(body)
        .into_iter()
        .filter_map(shipment_from_value)
        .collect()
}

fn truncated_value(value: &Value) -> String {
    let mut text = value.to_string();
    text.truncate(200);
    text
}

fn truncated_error(body: &Value) -> String {
    body.get("error").map(truncated_value).unwrap_or_default()
}
