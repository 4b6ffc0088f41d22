//! Acknowledgement payloads for packaging and handover requests

use serde::{Deserialize, Serialize};

use super::order::{OrderItem, RemoteOrder};

/// Sentinel `offerId` carrying the delivery cost instead of a product
pub const DELIVERY_OFFER_ID: &str = "delivery";

/// One box of an FBS packaging acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackagingBox {
    pub box_index: u32,
    pub box_code: String,
}

/// One line of a packaging acknowledgement
///
/// DBS shipments carry `quantity`; FBS shipments carry a `boxes`
/// breakdown and optionally a digital marking code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackagingItem {
    pub item_index: u32,
    pub offer_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boxes: Option<Vec<PackagingBox>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digital_mark: Option<String>,
}

impl PackagingItem {
    /// DBS line: item counted into the shipment as-is
    pub fn with_quantity(item_index: u32, offer_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            item_index,
            offer_id: offer_id.into(),
            quantity: Some(quantity),
            boxes: None,
            digital_mark: None,
        }
    }
}

/// One line of a handover acknowledgement
///
/// Every element must assert `handover_result == true`; anything else is
/// rejected by the client before the request is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoverItem {
    pub item_index: u32,
    pub handover_result: bool,
}

impl HandoverItem {
    pub fn new(item_index: u32) -> Self {
        Self {
            item_index,
            handover_result: true,
        }
    }
}

fn product_lines(order: &RemoteOrder) -> impl Iterator<Item = &OrderItem> {
    order
        .items
        .iter()
        .filter(|item| item.offer_id != DELIVERY_OFFER_ID)
}

/// Packaging payload from the remote line items, delivery sentinel excluded
pub fn packaging_items(order: &RemoteOrder) -> Vec<PackagingItem> {
    product_lines(order)
        .map(|item| PackagingItem::with_quantity(item.item_index, &item.offer_id, item.quantity))
        .collect()
}

/// Handover payload from the remote line items, delivery sentinel excluded
pub fn handover_items(order: &RemoteOrder) -> Vec<HandoverItem> {
    product_lines(order)
        .map(|item| HandoverItem::new(item.item_index))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_with_items() -> RemoteOrder {
        serde_json::from_value(serde_json::json!({
            "shipmentId": "123",
            "items": [
                {"itemIndex": 1, "offerId": "X", "finalPrice": 100, "quantity": 2},
                {"itemIndex": 2, "offerId": "delivery", "finalPrice": 800, "quantity": 1},
                {"itemIndex": 3, "offerId": "Y", "finalPrice": 50, "quantity": 1}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn packaging_payload_skips_delivery_sentinel() {
        let items = packaging_items(&order_with_items());
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].item_index, 1);
        assert_eq!(items[0].offer_id, "X");
        assert_eq!(items[0].quantity, Some(2));
        assert_eq!(items[1].item_index, 3);
    }

    #[test]
    fn handover_payload_asserts_result_for_every_line() {
        let items = handover_items(&order_with_items());
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.handover_result));
    }

    #[test]
    fn packaging_item_serializes_without_empty_fields() {
        let json =
            serde_json::to_value(PackagingItem::with_quantity(1, "X", 2)).unwrap();
        assert_eq!(json["itemIndex"], 1);
        assert_eq!(json["quantity"], 2);
        assert!(json.get("boxes").is_none());
        assert!(json.get("digitalMark").is_none());
    }
}
