//! Identifiers and reference enums for the order domain

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_id!(
    /// Local user profile owning a marketplace connection
    ProfileId
);
uuid_id!(
    /// Order aggregate identifier
    OrderId
);
uuid_id!(
    /// Order event (snapshot) identifier
    OrderEventId
);
uuid_id!(
    /// Current configuration event of a delivery type
    DeliveryEventId
);

/// Local order status, limited to the states this sync cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Just created, awaiting packaging
    New,
    /// Handed over at destination
    Completed,
    /// Cancelled before completion
    Canceled,
}

impl OrderStatus {
    /// Stable name used in deduplication keys
    pub fn name(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
        }
    }
}

/// Delivery type attached to an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryType {
    /// Megamarket DBS — merchant's own courier
    DbsMegamarket,
    /// Megamarket FBS — marketplace logistics
    FbsMegamarket,
    /// Customer pickup (not marketplace related)
    Pickup,
}

/// Payment type attached to an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    /// Cash on delivery (DBS, nothing deposited online)
    CashOnDelivery,
    /// Electronic payment through the marketplace, DBS scheme
    DbsMegamarket,
    /// Payment through the marketplace, FBS scheme
    FbsMegamarket,
}

/// Customer profile type attached to an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProfileType {
    DbsMegamarket,
    FbsMegamarket,
}

/// Catalog coordinates of the product resolved by article
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    pub event: Uuid,
    pub offer: Option<Uuid>,
    pub variation: Option<Uuid>,
    pub modification: Option<Uuid>,
}
