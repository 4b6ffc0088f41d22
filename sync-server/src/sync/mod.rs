//! Order status synchronization pipeline
//!
//! Intake discovers remote orders, the translator turns them into local
//! orders, and the dispatcher/worker pairs push local status transitions
//! back to the marketplace as packaging and close acknowledgements.

pub mod dispatch;
pub mod intake;
pub mod translate;
pub mod worker;

pub use dispatch::{StatusChangeDispatcher, TransitionKind, TransitionSpec};
pub use intake::NewOrderIntake;
pub use translate::OrderTranslator;
pub use worker::StatusChangeWorker;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use shared::message::SyncCommand;
use shared::order::OrderChanged;

use crate::bus::CommandReceiver;

/// Routes bus commands to their handlers until cancelled
pub struct SyncConsumer {
    pub translator: OrderTranslator,
    pub package_worker: StatusChangeWorker,
    pub close_worker: StatusChangeWorker,
}

impl SyncConsumer {
    pub async fn run(self, mut receiver: CommandReceiver, cancel: CancellationToken) {
        loop {
            let command = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Command consumer stopped");
                    break;
                }
                command = receiver.recv() => match command {
                    Some(command) => command,
                    None => break,
                },
            };

            match command {
                SyncCommand::Intake(cmd) => self.translator.handle(&cmd).await,
                SyncCommand::Package(cmd) => self.package_worker.handle(&cmd).await,
                SyncCommand::Close(cmd) => self.close_worker.handle(&cmd).await,
            }
        }
    }
}

/// Feeds order-changed notifications into both transition dispatchers
pub struct OrderChangedListener {
    pub package: StatusChangeDispatcher,
    pub close: StatusChangeDispatcher,
}

impl OrderChangedListener {
    pub async fn run(
        self,
        mut changes: mpsc::UnboundedReceiver<OrderChanged>,
        cancel: CancellationToken,
    ) {
        loop {
            let changed = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Order-changed listener stopped");
                    break;
                }
                changed = changes.recv() => match changed {
                    Some(changed) => changed,
                    None => break,
                },
            };

            self.package.handle(&changed).await;
            self.close.handle(&changed).await;
        }
    }
}
