//! Remote (Megamarket) order model and acknowledgement payloads
//!
//! The marketplace calls one unit of fulfillment a *shipment*; locally a
//! shipment maps onto one order whose number is the shipment id with the
//! `M-` prefix. Commands and remote calls always carry the bare shipment
//! id; the prefix exists only at the local-order boundary.

mod order;
mod payload;

pub use order::{
    AccessNotes, Address, Customer, DeliveryInterval, Geo, Handover, OrderItem, RemoteOrder,
    RemoteStatus, ServiceScheme,
};
pub use payload::{
    DELIVERY_OFFER_ID, HandoverItem, PackagingBox, PackagingItem, handover_items, packaging_items,
};

/// Prefix of local order numbers for this marketplace
pub const ORDER_PREFIX: &str = "M-";

/// Canonicalize an order identifier to the bare shipment id
///
/// Accepts either a bare shipment id or an `M-` prefixed local number.
pub fn strip_order_prefix(number: &str) -> &str {
    number.strip_prefix(ORDER_PREFIX).unwrap_or(number)
}

/// Local order number for a shipment id
pub fn local_order_number(shipment: &str) -> String {
    format!("{ORDER_PREFIX}{}", strip_order_prefix(shipment))
}
