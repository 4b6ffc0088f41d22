//! Acknowledgement workers for dispatched status transitions
//!
//! A worker re-fetches the remote order (never trusting the cache for a
//! status decision), builds the items payload and calls the matching
//! acknowledgement. Transient failures loop back through delayed
//! redelivery on the low-priority lane; permanent ones are logged and
//! dropped.

use std::sync::Arc;
use std::time::Duration;

use shared::market::{RemoteStatus, handover_items, packaging_items};
use shared::message::StatusChangeCommand;

use crate::bus::{CommandBus, MAX_REDELIVERIES};
use crate::client::MegamarketClient;
use crate::sync::dispatch::{TransitionKind, TransitionSpec};

pub struct StatusChangeWorker {
    spec: TransitionSpec,
    client: Arc<MegamarketClient>,
    bus: CommandBus,
    retry_delay: Duration,
}

impl StatusChangeWorker {
    pub fn new(
        spec: TransitionSpec,
        client: Arc<MegamarketClient>,
        bus: CommandBus,
        retry_delay: Duration,
    ) -> Self {
        Self {
            spec,
            client,
            bus,
            retry_delay,
        }
    }

    pub async fn handle(&self, command: &StatusChangeCommand) {
        let Some(remote) = self
            .client
            .fetch_order_fresh(&command.profile, &command.number)
            .await
        else {
            // Reads fail transiently; the remote order may appear later
            self.redeliver(command);
            return;
        };

        // A packaging command that arrives after the order progressed is
        // stale and must not fire
        if self.spec.kind == TransitionKind::Package && !remote.is_status(RemoteStatus::New) {
            tracing::error!(
                order = command.number,
                status = ?remote.status,
                "Packaging command is stale, order already progressed",
            );
            return;
        }

        let result = match self.spec.kind {
            TransitionKind::Package => {
                self.client
                    .acknowledge_packaging(&command.profile, &command.number, &packaging_items(&remote))
                    .await
            }
            TransitionKind::Close => {
                self.client
                    .acknowledge_handover(&command.profile, &command.number, &handover_items(&remote))
                    .await
            }
        };

        match result {
            Ok(true) => {
                tracing::info!(order = command.number, handler = self.spec.name, "Acknowledged");
            }
            Ok(false) => self.redeliver(command),
            Err(e) => {
                // Precondition violations are construction bugs, not
                // transient failures
                tracing::error!(
                    order = command.number,
                    handler = self.spec.name,
                    "Acknowledgement rejected: {e}",
                );
            }
        }
    }

    fn redeliver(&self, command: &StatusChangeCommand) {
        if command.attempt >= MAX_REDELIVERIES {
            tracing::error!(
                order = command.number,
                handler = self.spec.name,
                attempts = command.attempt,
                "Redelivery exhausted, command dropped",
            );
            return;
        }

        tracing::warn!(
            order = command.number,
            handler = self.spec.name,
            attempt = command.attempt,
            "Acknowledgement postponed",
        );
        self.bus
            .dispatch_delayed(self.spec.command(command.next_attempt()), self.retry_delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    use shared::message::SyncCommand;
    use shared::order::ProfileId;
    use shared::AppResult;

    use crate::bus;
    use crate::bus::CommandReceiver;
    use crate::client::{MarketResponse, MarketTransport};
    use crate::services::MemoryProfileRegistry;

    // Answers order/get with a fixed shipment and counts acknowledgements
    struct ScriptedTransport {
        shipment: serde_json::Value,
        ack_body: serde_json::Value,
        acks: AtomicU32,
    }

    #[async_trait::async_trait]
    impl MarketTransport for ScriptedTransport {
        async fn send(
            &self,
            _: reqwest::Method,
            path: &str,
            _: &serde_json::Value,
        ) -> AppResult<MarketResponse> {
            let body = if path.ends_with("/order/get") {
                json!({"success": 1, "data": {"shipments": [self.shipment]}})
            } else {
                self.acks.fetch_add(1, Ordering::SeqCst);
                self.ack_body.clone()
            };
            Ok(MarketResponse { status: 200, body })
        }
    }

    struct Fixture {
        worker: StatusChangeWorker,
        transport: Arc<ScriptedTransport>,
        receiver: CommandReceiver,
        profile: ProfileId,
    }

    fn fixture(spec: TransitionSpec, shipment: serde_json::Value, ack_body: serde_json::Value) -> Fixture {
        let transport = Arc::new(ScriptedTransport {
            shipment,
            ack_body,
            acks: AtomicU32::new(0),
        });
        let registry = Arc::new(MemoryProfileRegistry::new());
        let profile = ProfileId::new();
        registry.register(profile, "token");

        let client = Arc::new(MegamarketClient::new(transport.clone(), registry, true));
        let (bus, receiver) = bus::channel();

        Fixture {
            worker: StatusChangeWorker::new(spec, client, bus, Duration::from_secs(60)),
            transport,
            receiver,
            profile,
        }
    }

    fn shipment(status: &str) -> serde_json::Value {
        json!({
            "shipmentId": "946032218",
            "status": status,
            "items": [
                {"itemIndex": 1, "offerId": "X", "finalPrice": 100, "quantity": 2},
                {"itemIndex": 2, "offerId": "delivery", "finalPrice": 800, "quantity": 1}
            ]
        })
    }

    async fn try_recv(receiver: &mut CommandReceiver) -> Option<SyncCommand> {
        tokio::time::timeout(Duration::from_millis(10), receiver.recv())
            .await
            .ok()
            .flatten()
    }

    #[tokio::test]
    async fn packaging_acknowledges_a_new_remote_order() {
        let mut f = fixture(
            TransitionSpec::package(),
            shipment("NEW"),
            json!({"success": 1, "data": {}}),
        );

        let command = StatusChangeCommand::new("946032218", f.profile);
        f.worker.handle(&command).await;

        assert_eq!(f.transport.acks.load(Ordering::SeqCst), 1);
        assert!(try_recv(&mut f.receiver).await.is_none());
    }

    #[tokio::test]
    async fn packaging_drops_stale_command_without_acknowledging() {
        let mut f = fixture(
            TransitionSpec::package(),
            shipment("SHIPPED"),
            json!({"success": 1, "data": {}}),
        );

        let command = StatusChangeCommand::new("946032218", f.profile);
        f.worker.handle(&command).await;

        assert_eq!(f.transport.acks.load(Ordering::SeqCst), 0);
        assert!(try_recv(&mut f.receiver).await.is_none());
    }

    #[tokio::test]
    async fn close_ignores_remote_status() {
        let mut f = fixture(
            TransitionSpec::close(),
            shipment("SHIPPED"),
            json!({"success": 1, "data": {}}),
        );

        let command = StatusChangeCommand::new("946032218", f.profile);
        f.worker.handle(&command).await;

        assert_eq!(f.transport.acks.load(Ordering::SeqCst), 1);
        assert!(try_recv(&mut f.receiver).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_acknowledgement_is_redelivered_with_the_attempt_bumped() {
        let mut f = fixture(
            TransitionSpec::close(),
            shipment("SHIPPED"),
            json!({"error": {"message": "busy"}}),
        );

        let command = StatusChangeCommand::new("946032218", f.profile);
        f.worker.handle(&command).await;

        // In-client retry exhausted before the queue-level redelivery
        assert!(f.transport.acks.load(Ordering::SeqCst) > 1);
        match f.receiver.recv().await {
            Some(SyncCommand::Close(cmd)) => {
                assert_eq!(cmd.number, "946032218");
                assert_eq!(cmd.attempt, 1);
            }
            other => panic!("expected a redelivered close command, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn missing_remote_order_is_redelivered() {
        let transport = Arc::new(ScriptedTransport {
            shipment: json!(null),
            ack_body: json!({}),
            acks: AtomicU32::new(0),
        });
        let registry = Arc::new(MemoryProfileRegistry::new());
        let profile = ProfileId::new();
        registry.register(profile, "token");
        let client = Arc::new(MegamarketClient::new(transport, registry, true));
        let (bus, mut receiver) = bus::channel();

        let worker = StatusChangeWorker::new(
            TransitionSpec::package(),
            client,
            bus,
            Duration::from_secs(60),
        );
        worker.handle(&StatusChangeCommand::new("1", profile)).await;

        assert!(matches!(
            receiver.recv().await,
            Some(SyncCommand::Package(cmd)) if cmd.attempt == 1
        ));
    }

    #[tokio::test]
    async fn exhausted_redelivery_is_dropped() {
        let mut f = fixture(
            TransitionSpec::close(),
            shipment("SHIPPED"),
            json!({"success": 1}),
        );

        let mut command = StatusChangeCommand::new("946032218", f.profile);
        command.attempt = MAX_REDELIVERIES;
        f.worker.redeliver(&command);

        assert!(try_recv(&mut f.receiver).await.is_none());
    }
}
