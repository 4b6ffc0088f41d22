//! Deserialized view of a marketplace shipment
//!
//! The remote payload is read-only: fetched on demand, never owned or
//! persisted locally. Numeric fields arrive inconsistently as strings or
//! numbers depending on the endpoint, hence the lenient deserializers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Remote order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemoteStatus {
    New,
    Confirm,
    Packing,
    Shipped,
    Delivered,
    Canceled,
    #[serde(other)]
    Other,
}

/// Fulfillment scheme of the shipment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceScheme {
    /// DBS — merchant's own courier delivers
    DeliveryByMerchant,
    /// FBS — merchant packs, marketplace delivers
    FulfillmentByMerchant,
    #[serde(other)]
    Other,
}

impl ServiceScheme {
    pub fn is_dbs(&self) -> bool {
        matches!(self, Self::DeliveryByMerchant)
    }
}

/// One shipment as returned by `order/get` and `order/search`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteOrder {
    #[serde(deserialize_with = "de_string_or_number")]
    pub shipment_id: String,
    #[serde(default)]
    pub shipment_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<RemoteStatus>,
    #[serde(default)]
    pub handover: Option<Handover>,
    #[serde(default)]
    pub customer: Option<Customer>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

impl RemoteOrder {
    pub fn service_scheme(&self) -> Option<ServiceScheme> {
        self.handover.as_ref().map(|h| h.service_scheme)
    }

    pub fn is_status(&self, status: RemoteStatus) -> bool {
        self.status == Some(status)
    }
}

/// Handover block: scheme, prepaid amount, delivery window
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handover {
    pub service_scheme: ServiceScheme,
    /// Amount already paid online, minor currency units; 0 means cash on delivery
    #[serde(default)]
    pub deposited_amount: i64,
    #[serde(default)]
    pub delivery_interval: Option<DeliveryInterval>,
    #[serde(default)]
    pub packing_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryInterval {
    pub date_from: DateTime<Utc>,
    #[serde(default)]
    pub date_to: Option<DateTime<Utc>>,
}

/// Customer block of the shipment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(default)]
    pub customer_full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Raw address text as entered by the customer
    pub source: String,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub geo: Option<Geo>,
    #[serde(default)]
    pub access: Option<AccessNotes>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geo {
    #[serde(deserialize_with = "de_f64_lenient")]
    pub lat: f64,
    #[serde(deserialize_with = "de_f64_lenient")]
    pub lon: f64,
}

/// Access flags of the delivery address; empty/false values carry no note
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessNotes {
    #[serde(default)]
    pub detached_house: bool,
    #[serde(default)]
    pub entrance: Option<String>,
    #[serde(default)]
    pub floor: Option<String>,
    #[serde(default)]
    pub intercom: Option<String>,
    #[serde(default)]
    pub apartment: Option<String>,
    #[serde(default)]
    pub cargo_elevator: bool,
    #[serde(default)]
    pub comment: Option<String>,
}

/// One line item; an `offerId` of `"delivery"` is the delivery-cost sentinel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(deserialize_with = "de_u32_lenient")]
    pub item_index: u32,
    #[serde(default)]
    pub goods_id: Option<String>,
    pub offer_id: String,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub final_price: i64,
    #[serde(default = "one")]
    pub quantity: u32,
    #[serde(default)]
    pub is_digital_mark_required: bool,
}

fn one() -> u32 {
    1
}

fn de_string_or_number<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    match Value::deserialize(de)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

fn de_u32_lenient<'de, D: Deserializer<'de>>(de: D) -> Result<u32, D::Error> {
    match Value::deserialize(de)? {
        Value::String(s) => s.parse().map_err(serde::de::Error::custom),
        Value::Number(n) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| serde::de::Error::custom("index out of range")),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

fn de_f64_lenient<'de, D: Deserializer<'de>>(de: D) -> Result<f64, D::Error> {
    match Value::deserialize(de)? {
        Value::String(s) => s.parse().map_err(serde::de::Error::custom),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom("not a float")),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}
