//! Local status transition → acknowledgement command dispatch
//!
//! One generic pipeline handles both marketplace acknowledgements. A
//! [`TransitionSpec`] fixes the trigger status, the remote operation and
//! the policy for orders with a foreign delivery type; the dispatcher and
//! worker are instantiated once per spec.

use std::sync::Arc;

use shared::message::{StatusChangeCommand, SyncCommand};
use shared::order::{DeliveryType, OrderChanged, OrderEvent, OrderStatus};

use crate::bus::CommandBus;
use crate::services::{DedupKey, Deduplicator, OrderStore};

/// Which acknowledgement the transition drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Package,
    Close,
}

/// Parameters of one status transition
#[derive(Debug, Clone, Copy)]
pub struct TransitionSpec {
    pub kind: TransitionKind,
    /// Local status that triggers the transition
    pub trigger: OrderStatus,
    /// Stable dispatcher identity for deduplication keys
    pub name: &'static str,
    /// Whether a foreign-delivery skip is recorded as executed
    pub mark_dedup_on_skip: bool,
}

impl TransitionSpec {
    /// Packaging readiness: local `New`, remote `order/packing`
    ///
    /// A foreign delivery type is skipped without a dedup record so a
    /// later corrected event can still fire.
    pub fn package() -> Self {
        Self {
            kind: TransitionKind::Package,
            trigger: OrderStatus::New,
            name: "package",
            mark_dedup_on_skip: false,
        }
    }

    /// Handover: local `Completed`, remote `order/close`
    ///
    /// A foreign delivery type is legitimately out of scope and recorded
    /// as executed.
    pub fn close() -> Self {
        Self {
            kind: TransitionKind::Close,
            trigger: OrderStatus::Completed,
            name: "close",
            mark_dedup_on_skip: true,
        }
    }

    pub fn command(&self, command: StatusChangeCommand) -> SyncCommand {
        match self.kind {
            TransitionKind::Package => SyncCommand::Package(command),
            TransitionKind::Close => SyncCommand::Close(command),
        }
    }
}

pub struct StatusChangeDispatcher {
    spec: TransitionSpec,
    orders: Arc<dyn OrderStore>,
    dedup: Arc<dyn Deduplicator>,
    bus: CommandBus,
}

impl StatusChangeDispatcher {
    pub fn new(
        spec: TransitionSpec,
        orders: Arc<dyn OrderStore>,
        dedup: Arc<dyn Deduplicator>,
        bus: CommandBus,
    ) -> Self {
        Self {
            spec,
            orders,
            dedup,
            bus,
        }
    }

    /// React to one order-changed notification
    pub async fn handle(&self, changed: &OrderChanged) {
        // A first event has no prior state to transition from
        if changed.is_first() {
            return;
        }

        let key = DedupKey::new(changed.id, self.spec.trigger.name(), self.spec.name);
        if self.dedup.is_executed(&key).await {
            tracing::debug!(order = %changed.id, handler = self.spec.name, "Already dispatched");
            return;
        }

        let Some(event) = self.orders.find_event(&changed.event).await else {
            tracing::error!(order = %changed.id, event = %changed.event, "Order event not found");
            return;
        };

        if !event.is_status(self.spec.trigger) {
            return;
        }

        if !event.is_delivery(DeliveryType::DbsMegamarket) {
            if self.spec.mark_dedup_on_skip {
                self.dedup.save(&key).await;
            }
            return;
        }

        let Some((number, profile)) = self.identity(&event).await else {
            tracing::error!(order = %changed.id, "Order number or profile unresolvable");
            return;
        };

        self.bus
            .dispatch(self.spec.command(StatusChangeCommand::new(&number, profile)));
        self.dedup.save(&key).await;

        tracing::info!(order = number, handler = self.spec.name, "Status change dispatched");
    }

    /// Number and profile from the event, falling back to the order's
    /// current event when the snapshot has been superseded
    async fn identity(
        &self,
        event: &OrderEvent,
    ) -> Option<(String, shared::order::ProfileId)> {
        if let (Some(number), Some(profile)) = (event.number.clone(), event.profile) {
            return Some((number, profile));
        }

        let current = self.orders.current_event(&event.order_id).await?;
        Some((
            event.number.clone().or(current.number)?,
            event.profile.or(current.profile)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use shared::order::{OrderEventId, OrderId, ProfileId};

    use crate::bus;
    use crate::bus::CommandReceiver;
    use crate::services::{MemoryDeduplicator, MemoryOrderStore};

    struct Fixture {
        dispatcher: StatusChangeDispatcher,
        orders: Arc<MemoryOrderStore>,
        dedup: Arc<MemoryDeduplicator>,
        receiver: CommandReceiver,
        profile: ProfileId,
    }

    fn fixture(spec: TransitionSpec) -> Fixture {
        let orders = Arc::new(MemoryOrderStore::new());
        let dedup = Arc::new(MemoryDeduplicator::new());
        let (bus, receiver) = bus::channel();

        Fixture {
            dispatcher: StatusChangeDispatcher::new(
                spec,
                orders.clone(),
                dedup.clone(),
                bus,
            ),
            orders,
            dedup,
            receiver,
            profile: ProfileId::new(),
        }
    }

    fn event(
        f: &Fixture,
        status: OrderStatus,
        delivery: DeliveryType,
    ) -> (OrderChanged, OrderEvent) {
        let event = OrderEvent {
            id: OrderEventId::new(),
            order_id: OrderId::new(),
            number: Some("M-946032218".to_string()),
            status,
            delivery: Some(delivery),
            profile: Some(f.profile),
        };
        f.orders.record_event(event.clone());

        let changed = OrderChanged {
            id: event.order_id,
            event: event.id,
            last: Some(OrderEventId::new()),
        };
        (changed, event)
    }

    async fn try_recv(receiver: &mut CommandReceiver) -> Option<SyncCommand> {
        tokio::time::timeout(std::time::Duration::from_millis(10), receiver.recv())
            .await
            .ok()
            .flatten()
    }

    #[tokio::test]
    async fn new_dbs_order_dispatches_a_packaging_command() {
        let mut f = fixture(TransitionSpec::package());
        let (changed, _) = event(&f, OrderStatus::New, DeliveryType::DbsMegamarket);

        f.dispatcher.handle(&changed).await;

        match try_recv(&mut f.receiver).await {
            Some(SyncCommand::Package(cmd)) => {
                assert_eq!(cmd.number, "946032218");
                assert_eq!(cmd.profile, f.profile);
                assert_eq!(cmd.attempt, 0);
            }
            other => panic!("expected a packaging command, got {other:?}"),
        }

        // Dedup marked: a redelivered notification is ignored
        f.dispatcher.handle(&changed).await;
        assert!(try_recv(&mut f.receiver).await.is_none());
    }

    #[tokio::test]
    async fn completed_dbs_order_dispatches_a_close_command() {
        let mut f = fixture(TransitionSpec::close());
        let (changed, _) = event(&f, OrderStatus::Completed, DeliveryType::DbsMegamarket);

        f.dispatcher.handle(&changed).await;
        assert!(matches!(
            try_recv(&mut f.receiver).await,
            Some(SyncCommand::Close(_))
        ));
    }

    #[tokio::test]
    async fn first_event_is_ignored() {
        let mut f = fixture(TransitionSpec::package());
        let (mut changed, _) = event(&f, OrderStatus::New, DeliveryType::DbsMegamarket);
        changed.last = None;

        f.dispatcher.handle(&changed).await;
        assert!(try_recv(&mut f.receiver).await.is_none());
    }

    #[tokio::test]
    async fn wrong_status_is_skipped_silently() {
        let mut f = fixture(TransitionSpec::package());
        let (changed, _) = event(&f, OrderStatus::Completed, DeliveryType::DbsMegamarket);

        f.dispatcher.handle(&changed).await;
        assert!(try_recv(&mut f.receiver).await.is_none());
    }

    #[tokio::test]
    async fn close_marks_dedup_on_foreign_delivery_but_package_does_not() {
        let mut f = fixture(TransitionSpec::close());
        let (changed, _) = event(&f, OrderStatus::Completed, DeliveryType::Pickup);
        f.dispatcher.handle(&changed).await;
        assert!(try_recv(&mut f.receiver).await.is_none());
        let key = DedupKey::new(changed.id, OrderStatus::Completed.name(), "close");
        assert!(f.dedup.is_executed(&key).await);

        let mut f = fixture(TransitionSpec::package());
        let (changed, _) = event(&f, OrderStatus::New, DeliveryType::Pickup);
        f.dispatcher.handle(&changed).await;
        assert!(try_recv(&mut f.receiver).await.is_none());
        let key = DedupKey::new(changed.id, OrderStatus::New.name(), "package");
        assert!(!f.dedup.is_executed(&key).await);
    }

    #[tokio::test]
    async fn superseded_event_falls_back_to_the_current_snapshot() {
        let mut f = fixture(TransitionSpec::package());
        let (changed, mut stale) = event(&f, OrderStatus::New, DeliveryType::DbsMegamarket);

        // Strip identity from the delivered snapshot and record a current
        // event that still carries it
        stale.profile = None;
        f.orders.record_event(stale.clone());
        let current = OrderEvent {
            id: OrderEventId::new(),
            profile: Some(f.profile),
            ..stale.clone()
        };
        f.orders.record_event(current);

        f.dispatcher.handle(&changed).await;
        assert!(matches!(
            try_recv(&mut f.receiver).await,
            Some(SyncCommand::Package(_))
        ));
    }
}
