use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::broker::{BrokerError, Publisher};
use crate::outbox::{OutboxError, OutboxMessage, OutboxStatus, OutboxStore};

pub const DEFAULT_BATCH_SIZE: u64 = 10;
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelayReport {
    pub published: usize,
    pub failed: usize,
}

/// Drains pending outbox rows to the bus, one transaction per tick.
pub struct OutboxRelay {
    store: Arc<dyn OutboxStore>,
    publisher: Arc<dyn Publisher>,
    batch_size: u64,
    interval: Duration,
}

impl OutboxRelay {
    pub fn new(store: Arc<dyn OutboxStore>, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            store,
            publisher,
            batch_size: DEFAULT_BATCH_SIZE,
            interval: DEFAULT_INTERVAL,
        }
    }

    pub fn with_batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Publish one batch and commit the resulting statuses. A failed publish
    /// marks its row `failed` (it is retried on a later tick). A storage
    /// error or cancellation rolls the whole batch back.
    pub async fn tick(&self, cancel: &CancellationToken) -> Result<RelayReport, OutboxError> {
        if cancel.is_cancelled() {
            return Err(OutboxError::Cancelled);
        }

        let mut batch = self.store.begin().await?;
        let messages = batch.pending(self.batch_size).await?;
        let mut report = RelayReport::default();

        for message in &messages {
            let published = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(OutboxError::Cancelled),
                result = self.publish(message) => result,
            };
            let status = match published {
                Ok(()) => {
                    report.published += 1;
                    OutboxStatus::Success
                }
                Err(e) => {
                    warn!(
                        outbox_id = %message.id,
                        event_type = %message.event_type,
                        attempts = message.attempts + 1,
                        error = %e,
                        "outbox publish failed"
                    );
                    report.failed += 1;
                    OutboxStatus::Failed
                }
            };
            batch.update_status(message.id, status).await?;
        }

        batch.commit().await?;
        Ok(report)
    }

    async fn publish(&self, message: &OutboxMessage) -> Result<(), BrokerError> {
        let bus = message.to_bus_message().map_err(|e| BrokerError::Publish {
            queue: message.event_type.clone(),
            source: e.into(),
        })?;
        self.publisher.publish(&message.event_type, bus).await
    }

    /// Tick every `interval` until cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_ms = self.interval.as_millis() as u64, "outbox relay started");

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            match self.tick(&cancel).await {
                Ok(report) if report.published + report.failed > 0 => {
                    debug!(published = report.published, failed = report.failed, "outbox batch relayed");
                }
                Ok(_) => {}
                Err(OutboxError::Cancelled) => break,
                Err(e) => error!(error = ?e, "outbox batch aborted"),
            }
        }
        info!("outbox relay stopped");
    }
}
