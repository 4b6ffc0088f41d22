//! Periodic discovery of new marketplace orders
//!
//! Every tick lists `NEW` shipments of the trailing window for each
//! active profile and dispatches intake for the unknown ones. Fan-out is
//! at-least-once; the translator's existence check absorbs duplicates.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use shared::market::local_order_number;
use shared::message::{OrderIntakeCommand, SyncCommand};

use crate::bus::CommandBus;
use crate::client::MegamarketClient;
use crate::services::{OrderStore, ProfileRegistry};

pub struct NewOrderIntake {
    client: Arc<MegamarketClient>,
    orders: Arc<dyn OrderStore>,
    profiles: Arc<dyn ProfileRegistry>,
    bus: CommandBus,
    interval: Duration,
    window: chrono::Duration,
}

impl NewOrderIntake {
    pub fn new(
        client: Arc<MegamarketClient>,
        orders: Arc<dyn OrderStore>,
        profiles: Arc<dyn ProfileRegistry>,
        bus: CommandBus,
        interval: Duration,
        window: chrono::Duration,
    ) -> Self {
        Self {
            client,
            orders,
            profiles,
            bus,
            interval,
            window,
        }
    }

    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("New-order intake stopped");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }
    }

    /// One polling pass over all active profiles
    pub async fn tick(&self) -> usize {
        let mut dispatched = 0;

        for profile in self.profiles.active_profiles().await {
            for order in self.client.list_new_orders(&profile, self.window).await {
                let number = local_order_number(&order.shipment_id);
                if self.orders.exists_by_number(&number).await {
                    tracing::info!(order = number, "Order already known, skipped");
                    continue;
                }

                tracing::info!(order = number, profile = %profile, "New remote order");
                self.bus.dispatch(SyncCommand::Intake(OrderIntakeCommand::new(
                    &order.shipment_id,
                    profile,
                )));
                dispatched += 1;
            }
        }

        dispatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use shared::order::ProfileId;
    use shared::AppResult;

    use crate::bus;
    use crate::client::{MarketResponse, MarketTransport};
    use crate::services::{MemoryOrderStore, MemoryProfileRegistry};

    struct SearchTransport(serde_json::Value);

    #[async_trait::async_trait]
    impl MarketTransport for SearchTransport {
        async fn send(
            &self,
            _: reqwest::Method,
            _: &str,
            _: &serde_json::Value,
        ) -> AppResult<MarketResponse> {
            Ok(MarketResponse {
                status: 200,
                body: self.0.clone(),
            })
        }
    }

    fn intake(
        body: serde_json::Value,
        orders: Arc<MemoryOrderStore>,
    ) -> (NewOrderIntake, bus::CommandReceiver, ProfileId) {
        let registry = Arc::new(MemoryProfileRegistry::new());
        let profile = ProfileId::new();
        registry.register(profile, "token");

        let client = Arc::new(MegamarketClient::new(
            Arc::new(SearchTransport(body)),
            registry.clone(),
            true,
        ));
        let (bus, receiver) = bus::channel();

        let intake = NewOrderIntake::new(
            client,
            orders,
            registry,
            bus,
            Duration::from_secs(60),
            chrono::Duration::days(1),
        );
        (intake, receiver, profile)
    }

    #[tokio::test]
    async fn unknown_shipments_are_dispatched_for_intake() {
        let body = json!({"success": 1, "data": {"shipments": ["946032218", "946032219"]}});
        let (intake, mut receiver, profile) = intake(body, Arc::new(MemoryOrderStore::new()));

        assert_eq!(intake.tick().await, 2);

        match receiver.recv().await {
            Some(SyncCommand::Intake(cmd)) => {
                assert_eq!(cmd.shipment, "946032218");
                assert_eq!(cmd.profile, profile);
            }
            other => panic!("expected an intake command, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn known_numbers_are_skipped() {
        use shared::order::{
            DeliveryType, NewOrderCommand, OrderDelivery, PaymentType, ProfileType,
        };

        let orders = Arc::new(MemoryOrderStore::new());
        let body = json!({"success": 1, "data": {"shipments": ["946032218", "946032219"]}});
        let (intake, mut receiver, profile) = intake(body, orders.clone());

        orders
            .create(NewOrderCommand {
                number: "M-946032218".to_string(),
                created: chrono::Utc::now(),
                profile,
                profile_type: ProfileType::DbsMegamarket,
                payment: PaymentType::CashOnDelivery,
                delivery: OrderDelivery {
                    delivery_type: DeliveryType::DbsMegamarket,
                    date: None,
                    address: String::new(),
                    latitude: None,
                    longitude: None,
                    price: 0,
                    fields: Vec::new(),
                    event: None,
                },
                contacts: Vec::new(),
                comment: None,
                products: Vec::new(),
            })
            .await
            .unwrap();

        assert_eq!(intake.tick().await, 1);
        assert!(matches!(
            receiver.recv().await,
            Some(SyncCommand::Intake(cmd)) if cmd.shipment == "946032219"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn run_polls_until_cancelled() {
        let body = json!({"success": 1, "data": {"shipments": ["946032218"]}});
        let (intake, mut receiver, _) = intake(body, Arc::new(MemoryOrderStore::new()));

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(intake.run(cancel.clone()));

        // The first tick fires immediately and dispatches intake
        assert!(matches!(
            receiver.recv().await,
            Some(SyncCommand::Intake(cmd)) if cmd.shipment == "946032218"
        ));

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("intake task must stop on cancellation")
            .unwrap();
    }

    #[tokio::test]
    async fn empty_listing_dispatches_nothing() {
        let body = json!({"success": 1, "data": {"shipments": []}});
        let (intake, _receiver, _) = intake(body, Arc::new(MemoryOrderStore::new()));
        assert_eq!(intake.tick().await, 0);
    }
}
