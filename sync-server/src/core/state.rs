//! Shared server state
//!
//! Cloned into every handler and background task. All collaborators sit
//! behind `Arc`ed trait objects so tests can swap in the in-memory
//! implementations.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use shared::order::OrderChanged;

use crate::bus::{self, CommandBus, CommandReceiver};
use crate::client::{HttpTransport, MegamarketClient};
use crate::core::Config;
use crate::services::{
    Deduplicator, DeliveryDirectory, Geocoder, MemoryCatalog, MemoryDeduplicator,
    MemoryDeliveryDirectory, MemoryGeocoder, MemoryOrderStore, MemoryProfileDirectory,
    MemoryProfileRegistry, OrderStore, ProductCatalog, ProfileDirectory, ProfileRegistry,
};
use crate::sync::{
    NewOrderIntake, OrderChangedListener, OrderTranslator, StatusChangeDispatcher,
    StatusChangeWorker, SyncConsumer, TransitionSpec,
};

#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub bus: CommandBus,
    pub client: Arc<MegamarketClient>,
    pub orders: Arc<dyn OrderStore>,
    pub dedup: Arc<dyn Deduplicator>,
    pub catalog: Arc<dyn ProductCatalog>,
    pub geocoder: Arc<dyn Geocoder>,
    pub deliveries: Arc<dyn DeliveryDirectory>,
    pub profile_fields: Arc<dyn ProfileDirectory>,
    pub profiles: Arc<dyn ProfileRegistry>,
    /// Order aggregate notifications feeding the transition dispatchers
    pub order_changes: mpsc::UnboundedSender<OrderChanged>,
}

impl ServerState {
    /// Build state with the default in-memory collaborators
    ///
    /// Returns the state plus the receiving halves the server spawns the
    /// consumer and listener tasks from.
    pub fn initialize(
        config: Config,
    ) -> shared::AppResult<(
        Self,
        CommandReceiver,
        mpsc::UnboundedReceiver<OrderChanged>,
    )> {
        let (bus, receiver) = bus::channel();
        let (order_changes, changes_rx) = mpsc::unbounded_channel();

        let profiles = Arc::new(MemoryProfileRegistry::new());
        let transport = Arc::new(HttpTransport::new(
            config.market_base_url.clone(),
            config.request_timeout_ms,
        )?);
        let client = Arc::new(MegamarketClient::new(
            transport,
            profiles.clone(),
            config.is_production(),
        ));

        let state = Self {
            config,
            bus,
            client,
            orders: Arc::new(MemoryOrderStore::new()),
            dedup: Arc::new(MemoryDeduplicator::new()),
            catalog: Arc::new(MemoryCatalog::new()),
            geocoder: Arc::new(MemoryGeocoder::new()),
            deliveries: Arc::new(MemoryDeliveryDirectory::new()),
            profile_fields: Arc::new(MemoryProfileDirectory::new()),
            profiles,
            order_changes,
        };
        Ok((state, receiver, changes_rx))
    }

    pub fn translator(&self) -> OrderTranslator {
        OrderTranslator::new(
            self.client.clone(),
            self.orders.clone(),
            self.catalog.clone(),
            self.geocoder.clone(),
            self.deliveries.clone(),
            self.profile_fields.clone(),
        )
    }

    pub fn consumer(&self) -> SyncConsumer {
        let retry_delay = Duration::from_secs(self.config.retry_delay_secs);
        SyncConsumer {
            translator: self.translator(),
            package_worker: StatusChangeWorker::new(
                TransitionSpec::package(),
                self.client.clone(),
                self.bus.clone(),
                retry_delay,
            ),
            close_worker: StatusChangeWorker::new(
                TransitionSpec::close(),
                self.client.clone(),
                self.bus.clone(),
                retry_delay,
            ),
        }
    }

    pub fn order_changed_listener(&self) -> OrderChangedListener {
        OrderChangedListener {
            package: StatusChangeDispatcher::new(
                TransitionSpec::package(),
                self.orders.clone(),
                self.dedup.clone(),
                self.bus.clone(),
            ),
            close: StatusChangeDispatcher::new(
                TransitionSpec::close(),
                self.orders.clone(),
                self.dedup.clone(),
                self.bus.clone(),
            ),
        }
    }

    pub fn intake(&self) -> NewOrderIntake {
        NewOrderIntake::new(
            self.client.clone(),
            self.orders.clone(),
            self.profiles.clone(),
            self.bus.clone(),
            Duration::from_secs(self.config.intake_interval_secs),
            chrono::Duration::hours(self.config.intake_window_hours as i64),
        )
    }
}
