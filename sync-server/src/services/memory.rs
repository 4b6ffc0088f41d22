//! In-memory collaborator implementations
//!
//! Back the default wiring and the test fixtures. All maps are `DashMap`s
//! so handlers can run concurrently without extra locking.

use async_trait::async_trait;
use dashmap::DashMap;

use shared::error::{AppError, ErrorCode};
use shared::AppResult;
use shared::order::{
    DeliveryEventId, DeliveryType, NewOrderCommand, OrderEvent, OrderEventId, OrderId, OrderStatus,
    ProductRef, ProfileId, ProfileType,
};

use super::{
    ContactKind, DedupKey, Deduplicator, DeliveryDirectory, FieldKind, FormField, GeocodedAddress,
    Geocoder, OrderStore, ProductCatalog, ProfileDirectory, ProfileRegistry,
};

/// `DashMap`-backed deduplication store
#[derive(Debug, Default)]
pub struct MemoryDeduplicator {
    executed: DashMap<String, ()>,
}

impl MemoryDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Deduplicator for MemoryDeduplicator {
    async fn is_executed(&self, key: &DedupKey) -> bool {
        self.executed.contains_key(&key.composite())
    }

    async fn save(&self, key: &DedupKey) {
        self.executed.insert(key.composite(), ());
    }
}

/// In-memory order aggregate
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    numbers: DashMap<String, OrderId>,
    events: DashMap<OrderEventId, OrderEvent>,
    current: DashMap<OrderId, OrderEventId>,
    orders: DashMap<OrderId, NewOrderCommand>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of created orders
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Stored creation command of an order
    pub fn order(&self, id: &OrderId) -> Option<NewOrderCommand> {
        self.orders.get(id).map(|o| o.clone())
    }

    /// Record an event snapshot directly (status transitions in tests)
    pub fn record_event(&self, event: OrderEvent) {
        self.current.insert(event.order_id, event.id);
        self.events.insert(event.id, event);
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn exists_by_number(&self, number: &str) -> bool {
        self.numbers.contains_key(number)
    }

    async fn find_event(&self, event: &OrderEventId) -> Option<OrderEvent> {
        self.events.get(event).map(|e| e.clone())
    }

    async fn current_event(&self, order: &OrderId) -> Option<OrderEvent> {
        let event = self.current.get(order)?;
        self.events.get(&event).map(|e| e.clone())
    }

    async fn create(&self, order: NewOrderCommand) -> AppResult<OrderId> {
        let id = OrderId::new();

        // Atomic claim of the number; entry API prevents double insert
        // under concurrent delivery of the same intake command.
        match self.numbers.entry(order.number.clone()) {
            dashmap::Entry::Occupied(_) => {
                return Err(AppError::with_message(
                    ErrorCode::OrderNumberExists,
                    format!("order {} already exists", order.number),
                ));
            }
            dashmap::Entry::Vacant(entry) => {
                entry.insert(id);
            }
        }

        let event = OrderEvent {
            id: OrderEventId::new(),
            order_id: id,
            number: Some(order.number.clone()),
            status: OrderStatus::New,
            delivery: Some(order.delivery.delivery_type),
            profile: Some(order.profile),
        };
        self.record_event(event);
        self.orders.insert(id, order);

        Ok(id)
    }
}

/// In-memory product catalog keyed by article
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    products: DashMap<String, ProductRef>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, article: impl Into<String>, product: ProductRef) {
        self.products.insert(article.into(), product);
    }
}

#[async_trait]
impl ProductCatalog for MemoryCatalog {
    async fn find_by_article(&self, article: &str) -> Option<ProductRef> {
        self.products.get(article).map(|p| *p)
    }
}

/// Geocoder stub: normalizes nothing unless seeded
#[derive(Debug, Default)]
pub struct MemoryGeocoder {
    resolved: DashMap<String, (String, f64, f64)>,
}

impl MemoryGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &self,
        raw: impl Into<String>,
        normalized: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) {
        self.resolved
            .insert(raw.into(), (normalized.into(), latitude, longitude));
    }
}

#[async_trait]
impl Geocoder for MemoryGeocoder {
    async fn resolve(&self, address: &str) -> Option<GeocodedAddress> {
        self.resolved
            .get(address)
            .map(|entry| GeocodedAddress {
                address: entry.0.clone(),
                latitude: entry.1,
                longitude: entry.2,
            })
    }
}

/// Delivery-type metadata with the marketplace defaults
#[derive(Debug)]
pub struct MemoryDeliveryDirectory {
    events: DashMap<DeliveryType, DeliveryEventId>,
}

impl Default for MemoryDeliveryDirectory {
    fn default() -> Self {
        let events = DashMap::new();
        events.insert(DeliveryType::DbsMegamarket, DeliveryEventId::new());
        events.insert(DeliveryType::FbsMegamarket, DeliveryEventId::new());
        Self { events }
    }
}

impl MemoryDeliveryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeliveryDirectory for MemoryDeliveryDirectory {
    async fn fields(&self, delivery: DeliveryType) -> Vec<FormField> {
        match delivery {
            DeliveryType::DbsMegamarket | DeliveryType::FbsMegamarket => vec![FormField {
                name: "address".to_string(),
                kind: FieldKind::Address,
            }],
            DeliveryType::Pickup => Vec::new(),
        }
    }

    async fn current_event(&self, delivery: DeliveryType) -> Option<DeliveryEventId> {
        self.events.get(&delivery).map(|e| *e)
    }
}

/// Profile-type metadata: both marketplace types declare all three contacts
#[derive(Debug, Default)]
pub struct MemoryProfileDirectory;

impl MemoryProfileDirectory {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProfileDirectory for MemoryProfileDirectory {
    async fn contact_fields(&self, _profile_type: ProfileType) -> Vec<ContactKind> {
        vec![ContactKind::Email, ContactKind::FullName, ContactKind::Phone]
    }
}

/// Registered marketplace connections
#[derive(Debug, Default)]
pub struct MemoryProfileRegistry {
    tokens: DashMap<ProfileId, String>,
}

impl MemoryProfileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, profile: ProfileId, token: impl Into<String>) {
        self.tokens.insert(profile, token.into());
    }
}

#[async_trait]
impl ProfileRegistry for MemoryProfileRegistry {
    async fn active_profiles(&self) -> Vec<ProfileId> {
        self.tokens.iter().map(|entry| *entry.key()).collect()
    }

    async fn token(&self, profile: &ProfileId) -> Option<String> {
        self.tokens.get(profile).map(|t| t.clone())
    }
}
