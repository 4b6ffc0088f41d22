//! Collaborator contracts of the sync pipeline
//!
//! The order aggregate, deduplication store, geocoder, catalog and field
//! metadata all live elsewhere in the wider system; the pipeline talks to
//! them through these traits. In-memory implementations back the default
//! wiring and the tests.

mod memory;

pub use memory::{
    MemoryCatalog, MemoryDeduplicator, MemoryDeliveryDirectory, MemoryGeocoder, MemoryOrderStore,
    MemoryProfileDirectory, MemoryProfileRegistry,
};

use async_trait::async_trait;

use shared::AppResult;
use shared::order::{
    DeliveryEventId, DeliveryType, NewOrderCommand, OrderEvent, OrderEventId, OrderId, ProductRef,
    ProfileId, ProfileType,
};

/// Composite idempotency key: one side effect per (order, status, handler)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub order: OrderId,
    pub status: &'static str,
    pub handler: &'static str,
}

impl DedupKey {
    pub fn new(order: OrderId, status: &'static str, handler: &'static str) -> Self {
        Self {
            order,
            status,
            handler,
        }
    }

    pub fn composite(&self) -> String {
        format!("{}:{}:{}", self.order, self.status, self.handler)
    }
}

/// External idempotency guard with atomic check-and-set semantics
#[async_trait]
pub trait Deduplicator: Send + Sync {
    async fn is_executed(&self, key: &DedupKey) -> bool;
    async fn save(&self, key: &DedupKey);
}

/// Read/write access to the persistent order aggregate
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Whether a local order with this (prefixed) number exists
    async fn exists_by_number(&self, number: &str) -> bool;
    /// Resolve one event snapshot by id
    async fn find_event(&self, event: &OrderEventId) -> Option<OrderEvent>;
    /// Resolve the current (latest) event of an order
    async fn current_event(&self, order: &OrderId) -> Option<OrderEvent>;
    /// Create the order; enforces number uniqueness
    async fn create(&self, order: NewOrderCommand) -> AppResult<OrderId>;
}

/// Product catalog lookup by article
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn find_by_article(&self, article: &str) -> Option<ProductRef>;
}

/// Result of address normalization
#[derive(Debug, Clone)]
pub struct GeocodedAddress {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Address normalization / geocoding collaborator
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, address: &str) -> Option<GeocodedAddress>;
}

/// Kind of a declared delivery form field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Address,
    Text,
}

/// Declared form field of a delivery type
#[derive(Debug, Clone)]
pub struct FormField {
    pub name: String,
    pub kind: FieldKind,
}

/// Delivery-type metadata: declared form fields and current configuration event
#[async_trait]
pub trait DeliveryDirectory: Send + Sync {
    async fn fields(&self, delivery: DeliveryType) -> Vec<FormField>;
    async fn current_event(&self, delivery: DeliveryType) -> Option<DeliveryEventId>;
}

/// Contact field a profile type declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactKind {
    Email,
    FullName,
    Phone,
}

impl ContactKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::FullName => "full_name",
            Self::Phone => "phone",
        }
    }
}

/// Profile-type metadata: which contact fields the type declares
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn contact_fields(&self, profile_type: ProfileType) -> Vec<ContactKind>;
}

/// Active marketplace-connected profiles and their API tokens
#[async_trait]
pub trait ProfileRegistry: Send + Sync {
    async fn active_profiles(&self) -> Vec<ProfileId>;
    async fn token(&self, profile: &ProfileId) -> Option<String>;
}
