//! Order event snapshot and the change notification the bus delivers

use serde::{Deserialize, Serialize};

use super::types::{DeliveryType, OrderEventId, OrderId, OrderStatus, ProfileId};

/// Snapshot of one order event, as resolved from the order repository
///
/// A superseded event may lack the owning profile; callers re-resolve via
/// the current event for the order in that case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    pub id: OrderEventId,
    pub order_id: OrderId,
    /// Local order number, e.g. `M-9324005526611`
    pub number: Option<String>,
    pub status: OrderStatus,
    pub delivery: Option<DeliveryType>,
    pub profile: Option<ProfileId>,
}

impl OrderEvent {
    pub fn is_status(&self, status: OrderStatus) -> bool {
        self.status == status
    }

    pub fn is_delivery(&self, delivery: DeliveryType) -> bool {
        self.delivery == Some(delivery)
    }
}

/// "Local order event changed" notification from the order aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderChanged {
    pub id: OrderId,
    /// The event that was just recorded
    pub event: OrderEventId,
    /// The superseded event; `None` for an order's very first event
    pub last: Option<OrderEventId>,
}

impl OrderChanged {
    pub fn is_first(&self) -> bool {
        self.last.is_none()
    }
}
