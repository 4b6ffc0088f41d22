//! Request body builders for the order-service endpoints
//!
//! Pure functions from explicit request values to serialized bodies; the
//! client owns nothing stateful about a request besides the token lookup.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Value, json};

use shared::market::{HandoverItem, PackagingItem, local_order_number};

fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// `order/get` body: single-shipment lookup
pub fn order_get_body(token: &str, shipment: &str) -> Value {
    json!({
        "meta": {},
        "data": {
            "token": token,
            "shipments": [shipment],
        }
    })
}

/// `order/search` body: shipments in `NEW` status within the window
pub fn order_search_body(token: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> Value {
    json!({
        "meta": {},
        "data": {
            "token": token,
            "dateFrom": rfc3339(from),
            "dateTo": rfc3339(to),
            "statuses": ["NEW"],
        }
    })
}

/// `order/packing` body: items counted and boxed, ready for handover
pub fn order_packing_body(token: &str, shipment: &str, items: &[PackagingItem]) -> Value {
    json!({
        "meta": {},
        "data": {
            "token": token,
            "shipments": [{
                "shipmentId": shipment,
                "orderCode": local_order_number(shipment),
                "items": items,
            }],
        }
    })
}

/// `order/close` body: physical handover happened at `close_date`
pub fn order_close_body(
    token: &str,
    shipment: &str,
    close_date: DateTime<Utc>,
    items: &[HandoverItem],
) -> Value {
    json!({
        "meta": {},
        "data": {
            "token": token,
            "shipments": [{
                "shipmentId": shipment,
                "closeDate": rfc3339(close_date),
                "items": items,
            }],
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_body_shape() {
        let body = order_get_body("tok", "946032218");
        assert_eq!(body["data"]["token"], "tok");
        assert_eq!(body["data"]["shipments"], json!(["946032218"]));
        assert!(body["meta"].as_object().unwrap().is_empty());
    }

    #[test]
    fn search_body_carries_new_status_and_window() {
        let to = Utc::now();
        let from = to - chrono::Duration::days(1);
        let body = order_search_body("tok", from, to);

        assert_eq!(body["data"]["statuses"], json!(["NEW"]));
        assert_eq!(body["data"]["dateFrom"], json!(rfc3339(from)));
        assert_eq!(body["data"]["dateTo"], json!(rfc3339(to)));
    }

    #[test]
    fn packing_body_pairs_bare_id_with_prefixed_code() {
        let items = vec![PackagingItem::with_quantity(1, "X", 2)];
        let body = order_packing_body("tok", "946032218", &items);

        let shipment = &body["data"]["shipments"][0];
        assert_eq!(shipment["shipmentId"], "946032218");
        assert_eq!(shipment["orderCode"], "M-946032218");
        assert_eq!(shipment["items"][0]["offerId"], "X");
    }

    #[test]
    fn close_body_asserts_handover_result() {
        let items = vec![HandoverItem::new(1), HandoverItem::new(2)];
        let body = order_close_body("tok", "946032218", Utc::now(), &items);

        let shipment = &body["data"]["shipments"][0];
        assert!(shipment["closeDate"].is_string());
        assert_eq!(shipment["items"][1]["handoverResult"], true);
    }
}
