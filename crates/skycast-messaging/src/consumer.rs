//! Queue consumers.
//!
//! [`Consumer`] hands every delivery to its handler and acks on success.
//! [`IdempotentConsumer`] additionally records the `message_id` of each
//! delivery in an [`IdempotenceStore`] inside the same transaction as the
//! handler's side effect, so redeliveries of a processed message are acked
//! without running the handler again.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::broker::{BrokerError, Delivery, Subscriber};
use crate::message::BusMessage;

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("malformed message body")]
    Malformed(#[from] serde_json::Error),
    #[error("message handling failed")]
    Failed(#[source] anyhow::Error),
}

impl From<anyhow::Error> for HandlerError {
    fn from(err: anyhow::Error) -> Self {
        Self::Failed(err)
    }
}

#[async_trait::async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: &BusMessage) -> Result<(), HandlerError>;
}

#[derive(Debug, thiserror::Error)]
#[error("idempotence storage error")]
pub struct IdempotenceError(#[source] pub anyhow::Error);

/// Durable set of processed message ids.
#[async_trait::async_trait]
pub trait IdempotenceStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn IdempotenceTx>, IdempotenceError>;
}

/// Transaction over the processed-id set. Dropping without
/// [`IdempotenceTx::commit`] rolls the claim back.
#[async_trait::async_trait]
pub trait IdempotenceTx: Send {
    /// Record `message_id` as processed. Returns `false` when it already was.
    async fn try_claim(&mut self, message_id: &str) -> Result<bool, IdempotenceError>;

    async fn commit(self: Box<Self>) -> Result<(), IdempotenceError>;
}

/// How a delivery was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Acked,
    /// Already processed; acked without invoking the handler.
    Duplicate,
    /// Nacked without requeue.
    Rejected,
}

#[async_trait::async_trait]
pub trait ProcessDelivery: Send + Sync {
    async fn process(&self, delivery: &Delivery) -> Outcome;
}

// ── Consumer ─────────────────────────────────────────────────────────────────

pub struct Consumer {
    queue: String,
    subscriber: Arc<dyn Subscriber>,
    handler: Arc<dyn MessageHandler>,
}

impl Consumer {
    pub fn new(
        queue: impl Into<String>,
        subscriber: Arc<dyn Subscriber>,
        handler: Arc<dyn MessageHandler>,
    ) -> Self {
        Self {
            queue: queue.into(),
            subscriber,
            handler,
        }
    }

    pub async fn run(self, cancel: CancellationToken) -> Result<(), BrokerError> {
        run_loop(&self.queue, self.subscriber.as_ref(), &self, cancel).await
    }
}

#[async_trait::async_trait]
impl ProcessDelivery for Consumer {
    async fn process(&self, delivery: &Delivery) -> Outcome {
        match self.handler.handle(&delivery.message).await {
            Ok(()) => settle(delivery, Outcome::Acked).await,
            Err(e) => {
                warn!(queue = %self.queue, error = %e, "handler failed; rejecting delivery");
                settle(delivery, Outcome::Rejected).await
            }
        }
    }
}

// ── IdempotentConsumer ───────────────────────────────────────────────────────

pub struct IdempotentConsumer {
    queue: String,
    subscriber: Arc<dyn Subscriber>,
    handler: Arc<dyn MessageHandler>,
    store: Arc<dyn IdempotenceStore>,
}

#[derive(Debug, thiserror::Error)]
enum ClaimError {
    #[error(transparent)]
    Idempotence(#[from] IdempotenceError),
    #[error(transparent)]
    Handler(#[from] HandlerError),
}

impl IdempotentConsumer {
    pub fn new(
        queue: impl Into<String>,
        subscriber: Arc<dyn Subscriber>,
        handler: Arc<dyn MessageHandler>,
        store: Arc<dyn IdempotenceStore>,
    ) -> Self {
        Self {
            queue: queue.into(),
            subscriber,
            handler,
            store,
        }
    }

    pub async fn run(self, cancel: CancellationToken) -> Result<(), BrokerError> {
        run_loop(&self.queue, self.subscriber.as_ref(), &self, cancel).await
    }

    /// Claim, handle and commit. The claim is rolled back when the handler fails.
    async fn process_claimed(&self, message_id: &str, message: &BusMessage) -> Result<Outcome, ClaimError> {
        let mut tx = self.store.begin().await?;
        if !tx.try_claim(message_id).await? {
            tx.commit().await?;
            return Ok(Outcome::Duplicate);
        }
        self.handler.handle(message).await?;
        tx.commit().await?;
        Ok(Outcome::Acked)
    }
}

#[async_trait::async_trait]
impl ProcessDelivery for IdempotentConsumer {
    async fn process(&self, delivery: &Delivery) -> Outcome {
        let Some(message_id) = delivery.message.message_id() else {
            warn!(queue = %self.queue, "delivery without message_id; rejecting");
            return settle(delivery, Outcome::Rejected).await;
        };

        match self.process_claimed(message_id, &delivery.message).await {
            Ok(outcome) => {
                if outcome == Outcome::Duplicate {
                    debug!(queue = %self.queue, message_id, "duplicate delivery acknowledged");
                }
                settle(delivery, outcome).await
            }
            Err(e) => {
                warn!(queue = %self.queue, message_id, error = %e, "processing failed; rejecting delivery");
                settle(delivery, Outcome::Rejected).await
            }
        }
    }
}

async fn settle(delivery: &Delivery, outcome: Outcome) -> Outcome {
    let result = match outcome {
        Outcome::Acked | Outcome::Duplicate => delivery.ack().await,
        Outcome::Rejected => delivery.nack(false).await,
    };
    if let Err(e) = result {
        error!(error = %e, ?outcome, "failed to settle delivery");
    }
    outcome
}

/// Pull deliveries until `cancel` fires or the stream ends. A delivery in
/// progress is always settled before the loop observes cancellation.
pub async fn run_loop<P: ProcessDelivery + ?Sized>(
    queue: &str,
    subscriber: &dyn Subscriber,
    processor: &P,
    cancel: CancellationToken,
) -> Result<(), BrokerError> {
    let mut deliveries = subscriber.subscribe(queue).await?;
    info!(queue, "consumer started");

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!(queue, "consumer cancelled");
                return Ok(());
            }
            next = deliveries.next() => next,
        };

        match next {
            Some(Ok(delivery)) => {
                processor
                    .process(&delivery)
                    .instrument(info_span!("delivery", queue))
                    .await;
            }
            Some(Err(e)) => {
                error!(queue, error = %e, "delivery stream failed");
                return Err(e);
            }
            None => {
                info!(queue, "delivery stream closed");
                return Ok(());
            }
        }
    }
}

/// Background consumer tasks sharing one shutdown path.
#[derive(Default)]
pub struct ConsumerGroup {
    tasks: JoinSet<Result<(), BrokerError>>,
}

impl ConsumerGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&mut self, consumer: F)
    where
        F: Future<Output = Result<(), BrokerError>> + Send + 'static,
    {
        self.tasks.spawn(consumer);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for every consumer to return, aborting stragglers after `grace`.
    pub async fn shutdown(mut self, grace: Duration) {
        let drained = tokio::time::timeout(grace, drain(&mut self.tasks)).await;
        if drained.is_err() {
            warn!(remaining = self.tasks.len(), "consumers did not stop in time; aborting");
            self.tasks.abort_all();
        }
    }
}

async fn drain(tasks: &mut JoinSet<Result<(), BrokerError>>) {
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "consumer exited with error"),
            Err(e) => error!(error = %e, "consumer task panicked"),
        }
    }
}
