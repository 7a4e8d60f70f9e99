//! Broker ports. Adapters live in [`crate::amqp`] and [`crate::memory`].

use std::sync::Arc;

use futures::stream::BoxStream;

use crate::message::BusMessage;

#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("broker connection failed")]
    Connection(#[source] anyhow::Error),
    #[error("publish to {queue} failed")]
    Publish {
        queue: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("subscribe to {queue} failed")]
    Subscribe {
        queue: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("delivery stream failed")]
    Stream(#[source] anyhow::Error),
    #[error("acknowledgement failed")]
    Ack(#[source] anyhow::Error),
}

/// Publishes messages to a named queue.
#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, queue: &str, message: BusMessage) -> Result<(), BrokerError>;
}

#[async_trait::async_trait]
impl<T: Publisher + ?Sized> Publisher for Arc<T> {
    async fn publish(&self, queue: &str, message: BusMessage) -> Result<(), BrokerError> {
        (**self).publish(queue, message).await
    }
}

/// Settles a single delivery with the broker.
#[async_trait::async_trait]
pub trait Acker: Send + Sync {
    async fn ack(&self) -> Result<(), BrokerError>;
    async fn nack(&self, requeue: bool) -> Result<(), BrokerError>;
}

/// A received message together with the handle that settles it.
pub struct Delivery {
    pub message: BusMessage,
    acker: Box<dyn Acker>,
}

impl Delivery {
    pub fn new(message: BusMessage, acker: Box<dyn Acker>) -> Self {
        Self { message, acker }
    }

    pub async fn ack(&self) -> Result<(), BrokerError> {
        self.acker.ack().await
    }

    pub async fn nack(&self, requeue: bool) -> Result<(), BrokerError> {
        self.acker.nack(requeue).await
    }
}

impl std::fmt::Debug for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delivery")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

pub type DeliveryStream = BoxStream<'static, Result<Delivery, BrokerError>>;

/// Opens a delivery stream on a named queue.
#[async_trait::async_trait]
pub trait Subscriber: Send + Sync {
    async fn subscribe(&self, queue: &str) -> Result<DeliveryStream, BrokerError>;
}

#[async_trait::async_trait]
impl<T: Subscriber + ?Sized> Subscriber for Arc<T> {
    async fn subscribe(&self, queue: &str) -> Result<DeliveryStream, BrokerError> {
        (**self).subscribe(queue).await
    }
}
