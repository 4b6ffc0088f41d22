//! Order-creation command assembled by the translator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{
    DeliveryEventId, DeliveryType, PaymentType, ProductRef, ProfileId, ProfileType,
};

/// One product line of the new order
///
/// Lines are aggregated by article: a repeated article increments the
/// quantity of the existing line instead of adding a new one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductLine {
    pub article: String,
    /// Per-unit final price, minor currency units
    pub price: i64,
    pub quantity: u32,
    /// Catalog coordinates resolved by article
    pub product: ProductRef,
}

/// Declared form field of the delivery type, filled with a value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormFieldValue {
    pub field: String,
    pub value: String,
}

/// Profile contact field (email, full name, phone, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactField {
    pub field: String,
    pub value: String,
}

/// Delivery section of the new order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDelivery {
    pub delivery_type: DeliveryType,
    /// Start of the remote delivery window
    pub date: Option<DateTime<Utc>>,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Delivery cost taken from the sentinel line item
    pub price: i64,
    /// Declared delivery form fields with values (e.g. the address field)
    pub fields: Vec<FormFieldValue>,
    /// Current configuration event of the delivery type
    pub event: Option<DeliveryEventId>,
}

/// Command submitted to the order aggregate handler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderCommand {
    /// Prefixed local order number, e.g. `M-9324005526611`
    pub number: String,
    /// Remote shipment creation timestamp
    pub created: DateTime<Utc>,
    /// Owning local profile
    pub profile: ProfileId,
    pub profile_type: ProfileType,
    pub payment: PaymentType,
    pub delivery: OrderDelivery,
    /// Contact fields matching the profile-type schema
    pub contacts: Vec<ContactField>,
    /// Customer comment assembled from address access flags
    pub comment: Option<String>,
    pub products: Vec<ProductLine>,
}
