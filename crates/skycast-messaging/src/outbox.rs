//! Transactional outbox: rows written alongside domain changes and later
//! drained to the bus by [`crate::relay::OutboxRelay`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use skycast_domain::event::EventName;
use uuid::Uuid;

use crate::message::BusMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutboxStatus {
    Pending,
    Failed,
    Success,
}

impl OutboxStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Failed => "failed",
            Self::Success => "success",
        }
    }

    /// Rows in this state are never picked up again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Eligible for the next relay batch.
    pub fn is_pending(self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for OutboxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutboxStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "failed" => Ok(Self::Failed),
            "success" => Ok(Self::Success),
            other => Err(format!("unknown outbox status {other:?}")),
        }
    }
}

/// An outbox row about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOutboxMessage {
    pub aggregate_id: Uuid,
    pub message_id: Uuid,
    pub event_type: String,
    pub payload: serde_json::Value,
}

impl NewOutboxMessage {
    /// Encode `body` for `event`, to be published under `message_id`.
    pub fn new<T: Serialize>(
        aggregate_id: Uuid,
        event: EventName,
        message_id: Uuid,
        body: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            aggregate_id,
            message_id,
            event_type: event.queue().to_owned(),
            payload: serde_json::to_value(body)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutboxMessage {
    pub id: Uuid,
    pub aggregate_id: Uuid,
    pub message_id: Uuid,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub status: OutboxStatus,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OutboxMessage {
    pub fn from_new(new: NewOutboxMessage) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            aggregate_id: new.aggregate_id,
            message_id: new.message_id,
            event_type: new.event_type,
            payload: new.payload,
            status: OutboxStatus::Pending,
            attempts: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// The bus form of this row, carrying its `message_id` header.
    pub fn to_bus_message(&self) -> Result<BusMessage, serde_json::Error> {
        Ok(BusMessage::json(&self.payload)?.with_message_id(self.message_id))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OutboxError {
    #[error("outbox storage error")]
    Storage(#[source] anyhow::Error),
    #[error("outbox payload could not be encoded")]
    Encode(#[from] serde_json::Error),
    #[error("outbox relay cancelled")]
    Cancelled,
}

/// Opens relay batches over the outbox table.
#[async_trait::async_trait]
pub trait OutboxStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn OutboxBatch>, OutboxError>;
}

/// One relay transaction. Rows returned by [`OutboxBatch::pending`] stay
/// locked against other batches until the batch commits or is dropped;
/// dropping without [`OutboxBatch::commit`] discards every status update.
#[async_trait::async_trait]
pub trait OutboxBatch: Send {
    /// Up to `limit` non-terminal rows in `created_at` order, skipping rows
    /// locked by concurrent batches.
    async fn pending(&mut self, limit: u64) -> Result<Vec<OutboxMessage>, OutboxError>;

    async fn update_status(&mut self, id: Uuid, status: OutboxStatus) -> Result<(), OutboxError>;

    async fn commit(self: Box<Self>) -> Result<(), OutboxError>;
}
