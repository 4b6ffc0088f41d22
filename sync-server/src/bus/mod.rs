//! In-process command bus
//!
//! Two lanes feed one consumer: a main lane for fresh work and a
//! low-priority lane for delayed retries, so redeliveries never starve
//! newly dispatched commands. Delivery is at-least-once from the
//! handlers' point of view; they are written to tolerate duplicates.

use tokio::sync::mpsc;
use tokio::time::Duration;

use shared::message::SyncCommand;

/// Redeliveries per command before the dead-letter log
///
/// With the one-minute redelivery delay this rides out roughly half an
/// hour of remote outage.
pub const MAX_REDELIVERIES: u32 = 30;

/// Sending half of the bus; cheap to clone into handlers
#[derive(Debug, Clone)]
pub struct CommandBus {
    tx: mpsc::UnboundedSender<SyncCommand>,
    retry_tx: mpsc::UnboundedSender<SyncCommand>,
}

/// Receiving half, consumed by the command consumer task
#[derive(Debug)]
pub struct CommandReceiver {
    rx: mpsc::UnboundedReceiver<SyncCommand>,
    retry_rx: mpsc::UnboundedReceiver<SyncCommand>,
}

/// Create a connected bus/receiver pair
pub fn channel() -> (CommandBus, CommandReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let (retry_tx, retry_rx) = mpsc::unbounded_channel();
    (CommandBus { tx, retry_tx }, CommandReceiver { rx, retry_rx })
}

impl CommandBus {
    /// Dispatch onto the main lane
    pub fn dispatch(&self, command: SyncCommand) {
        if self.tx.send(command).is_err() {
            tracing::error!("Command bus closed, command dropped");
        }
    }

    /// Redeliver after `delay` on the low-priority lane
    pub fn dispatch_delayed(&self, command: SyncCommand, delay: Duration) {
        let retry_tx = self.retry_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if retry_tx.send(command).is_err() {
                tracing::error!("Command bus closed, delayed command dropped");
            }
        });
    }
}

impl CommandReceiver {
    /// Next command; main lane wins when both have work
    ///
    /// Returns `None` once both senders are gone.
    pub async fn recv(&mut self) -> Option<SyncCommand> {
        loop {
            tokio::select! {
                biased;
                cmd = self.rx.recv() => return cmd,
                cmd = self.retry_rx.recv() => match cmd {
                    Some(cmd) => return Some(cmd),
                    // Retry lane closed; keep serving the main lane
                    None => continue,
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::message::StatusChangeCommand;
    use shared::order::ProfileId;

    fn package(number: &str, profile: ProfileId) -> SyncCommand {
        SyncCommand::Package(StatusChangeCommand::new(number, profile))
    }

    #[tokio::test]
    async fn main_lane_wins_over_retry_lane() {
        let profile = ProfileId::new();
        let (bus, mut receiver) = channel();

        bus.dispatch_delayed(package("1", profile), Duration::ZERO);
        // Give the delayed task a chance to land on the retry lane first
        tokio::time::sleep(Duration::from_millis(20)).await;
        bus.dispatch(package("2", profile));

        assert_eq!(receiver.recv().await, Some(package("2", profile)));
        assert_eq!(receiver.recv().await, Some(package("1", profile)));
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_dispatch_waits_out_the_delay() {
        let profile = ProfileId::new();
        let (bus, mut receiver) = channel();
        bus.dispatch_delayed(package("1", profile), Duration::from_secs(60));

        tokio::time::timeout(Duration::from_secs(59), receiver.recv())
            .await
            .expect_err("command must not arrive before the delay");

        let cmd = tokio::time::timeout(Duration::from_secs(2), receiver.recv())
            .await
            .expect("command must arrive after the delay");
        assert_eq!(cmd, Some(package("1", profile)));
    }
}
