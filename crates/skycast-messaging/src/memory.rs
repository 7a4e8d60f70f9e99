//! In-memory broker, outbox and idempotence store for tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use futures::StreamExt;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::broker::{Acker, BrokerError, Delivery, DeliveryStream, Publisher, Subscriber};
use crate::consumer::{IdempotenceError, IdempotenceStore, IdempotenceTx};
use crate::message::BusMessage;
use crate::outbox::{
    NewOutboxMessage, OutboxBatch, OutboxError, OutboxMessage, OutboxStatus, OutboxStore,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ── InMemoryBroker ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckOutcome {
    Ack,
    Nack { requeue: bool },
}

#[derive(Default)]
struct QueueState {
    sender: Option<mpsc::UnboundedSender<BusMessage>>,
    receiver: Option<mpsc::UnboundedReceiver<BusMessage>>,
    closed: bool,
}

impl QueueState {
    fn open() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender: Some(sender),
            receiver: Some(receiver),
            closed: false,
        }
    }
}

#[derive(Default)]
struct BrokerState {
    queues: HashMap<String, QueueState>,
    published: Vec<(String, BusMessage)>,
    outcomes: Vec<AckOutcome>,
    fail_publishes: bool,
}

impl BrokerState {
    fn queue(&mut self, name: &str) -> &mut QueueState {
        self.queues
            .entry(name.to_owned())
            .or_insert_with(QueueState::open)
    }
}

/// Broker whose queues are unbounded channels. Messages published before a
/// subscriber attaches are buffered.
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    state: Arc<Mutex<BrokerState>>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every successful publish, in order.
    pub fn published(&self) -> Vec<(String, BusMessage)> {
        lock(&self.state).published.clone()
    }

    pub fn published_to(&self, queue: &str) -> Vec<BusMessage> {
        lock(&self.state)
            .published
            .iter()
            .filter(|(q, _)| q == queue)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Settlements of consumed deliveries, in order.
    pub fn outcomes(&self) -> Vec<AckOutcome> {
        lock(&self.state).outcomes.clone()
    }

    pub fn set_fail_publishes(&self, fail: bool) {
        lock(&self.state).fail_publishes = fail;
    }

    /// End the delivery stream of `queue` once its buffered messages are drained.
    pub fn close_queue(&self, queue: &str) {
        let mut state = lock(&self.state);
        let queue = state.queue(queue);
        queue.sender = None;
        queue.closed = true;
    }
}

#[async_trait::async_trait]
impl Publisher for InMemoryBroker {
    async fn publish(&self, queue: &str, message: BusMessage) -> Result<(), BrokerError> {
        let mut state = lock(&self.state);
        let failure = |reason: &str| BrokerError::Publish {
            queue: queue.to_owned(),
            source: anyhow::anyhow!("{reason}"),
        };
        if state.fail_publishes {
            return Err(failure("broker unavailable"));
        }
        let sender = state
            .queue(queue)
            .sender
            .clone()
            .ok_or_else(|| failure("queue closed"))?;
        sender
            .send(message.clone())
            .map_err(|_| failure("queue closed"))?;
        state.published.push((queue.to_owned(), message));
        Ok(())
    }
}

#[async_trait::async_trait]
impl Subscriber for InMemoryBroker {
    async fn subscribe(&self, queue: &str) -> Result<DeliveryStream, BrokerError> {
        let receiver = lock(&self.state).queue(queue).receiver.take().ok_or_else(|| {
            BrokerError::Subscribe {
                queue: queue.to_owned(),
                source: anyhow::anyhow!("queue already has a subscriber"),
            }
        })?;
        let state = self.state.clone();
        let stream = futures::stream::unfold(receiver, move |mut receiver| {
            let state = state.clone();
            async move {
                let message = receiver.recv().await?;
                let acker = MemoryAcker { state };
                Some((Ok(Delivery::new(message, Box::new(acker))), receiver))
            }
        });
        Ok(stream.boxed())
    }
}

struct MemoryAcker {
    state: Arc<Mutex<BrokerState>>,
}

#[async_trait::async_trait]
impl Acker for MemoryAcker {
    async fn ack(&self) -> Result<(), BrokerError> {
        lock(&self.state).outcomes.push(AckOutcome::Ack);
        Ok(())
    }

    async fn nack(&self, requeue: bool) -> Result<(), BrokerError> {
        lock(&self.state).outcomes.push(AckOutcome::Nack { requeue });
        Ok(())
    }
}

// ── InMemoryOutbox ───────────────────────────────────────────────────────────

#[derive(Default)]
struct OutboxState {
    rows: Vec<OutboxMessage>,
    locked: HashSet<Uuid>,
    fail_updates: bool,
}

/// Outbox table with row locks that mimic `FOR UPDATE SKIP LOCKED`.
#[derive(Clone, Default)]
pub struct InMemoryOutbox {
    state: Arc<Mutex<OutboxState>>,
}

impl InMemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save(&self, new: NewOutboxMessage) -> OutboxMessage {
        let row = OutboxMessage::from_new(new);
        lock(&self.state).rows.push(row.clone());
        row
    }

    pub fn rows(&self) -> Vec<OutboxMessage> {
        lock(&self.state).rows.clone()
    }

    pub fn get(&self, id: Uuid) -> Option<OutboxMessage> {
        lock(&self.state).rows.iter().find(|r| r.id == id).cloned()
    }

    /// Make every `update_status` call fail.
    pub fn set_fail_updates(&self, fail: bool) {
        lock(&self.state).fail_updates = fail;
    }
}

#[async_trait::async_trait]
impl OutboxStore for InMemoryOutbox {
    async fn begin(&self) -> Result<Box<dyn OutboxBatch>, OutboxError> {
        Ok(Box::new(InMemoryBatch {
            state: self.state.clone(),
            locked: Vec::new(),
            staged: Vec::new(),
        }))
    }
}

struct InMemoryBatch {
    state: Arc<Mutex<OutboxState>>,
    locked: Vec<Uuid>,
    staged: Vec<(Uuid, OutboxStatus)>,
}

#[async_trait::async_trait]
impl OutboxBatch for InMemoryBatch {
    async fn pending(&mut self, limit: u64) -> Result<Vec<OutboxMessage>, OutboxError> {
        let mut state = lock(&self.state);
        let mut candidates: Vec<OutboxMessage> = state
            .rows
            .iter()
            .filter(|r| !r.status.is_terminal() && !state.locked.contains(&r.id))
            .cloned()
            .collect();
        candidates.sort_by_key(|r| (r.created_at, r.id));
        candidates.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        for row in &candidates {
            state.locked.insert(row.id);
            self.locked.push(row.id);
        }
        Ok(candidates)
    }

    async fn update_status(&mut self, id: Uuid, status: OutboxStatus) -> Result<(), OutboxError> {
        if lock(&self.state).fail_updates {
            return Err(OutboxError::Storage(anyhow::anyhow!("update rejected")));
        }
        self.staged.push((id, status));
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> Result<(), OutboxError> {
        let staged = std::mem::take(&mut self.staged);
        let mut state = lock(&self.state);
        let now = Utc::now();
        for (id, status) in staged {
            if let Some(row) = state.rows.iter_mut().find(|r| r.id == id) {
                row.status = status;
                row.attempts += 1;
                row.updated_at = now;
            }
        }
        Ok(())
    }
}

impl Drop for InMemoryBatch {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        for id in &self.locked {
            state.locked.remove(id);
        }
    }
}

// ── InMemoryIdempotenceStore ─────────────────────────────────────────────────

#[derive(Default)]
struct IdempotenceState {
    processed: Vec<String>,
    unavailable: bool,
}

#[derive(Clone, Default)]
pub struct InMemoryIdempotenceStore {
    state: Arc<Mutex<IdempotenceState>>,
}

impl InMemoryIdempotenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed message ids, in claim order.
    pub fn processed(&self) -> Vec<String> {
        lock(&self.state).processed.clone()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        lock(&self.state).unavailable = unavailable;
    }
}

#[async_trait::async_trait]
impl IdempotenceStore for InMemoryIdempotenceStore {
    async fn begin(&self) -> Result<Box<dyn IdempotenceTx>, IdempotenceError> {
        if lock(&self.state).unavailable {
            return Err(IdempotenceError(anyhow::anyhow!("connection refused")));
        }
        Ok(Box::new(InMemoryIdempotenceTx {
            state: self.state.clone(),
            claimed: None,
        }))
    }
}

struct InMemoryIdempotenceTx {
    state: Arc<Mutex<IdempotenceState>>,
    claimed: Option<String>,
}

#[async_trait::async_trait]
impl IdempotenceTx for InMemoryIdempotenceTx {
    async fn try_claim(&mut self, message_id: &str) -> Result<bool, IdempotenceError> {
        let seen = lock(&self.state).processed.iter().any(|id| id == message_id);
        if seen || self.claimed.as_deref() == Some(message_id) {
            return Ok(false);
        }
        self.claimed = Some(message_id.to_owned());
        Ok(true)
    }

    async fn commit(self: Box<Self>) -> Result<(), IdempotenceError> {
        if let Some(id) = self.claimed {
            lock(&self.state).processed.push(id);
        }
        Ok(())
    }
}
