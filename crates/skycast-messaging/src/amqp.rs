//! RabbitMQ adapter over `lapin`.
//!
//! Queues are durable, non-exclusive and never auto-deleted. Messages go to
//! the default exchange with the queue name as routing key.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use futures::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicPublishOptions, BasicQosOptions,
    ConfirmSelectOptions, QueueDeclareOptions,
};
use lapin::types::{AMQPValue, FieldTable, LongString, ShortString};
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use tracing::{debug, info};

use crate::broker::{Acker, BrokerError, Delivery, DeliveryStream, Publisher, Subscriber};
use crate::message::{BusMessage, JSON_CONTENT_TYPE};

const PERSISTENT: u8 = 2;
const DEFAULT_PREFETCH: u16 = 10;

pub struct AmqpConnection {
    connection: Connection,
}

impl AmqpConnection {
    pub async fn connect(url: &str) -> Result<Self, BrokerError> {
        let connection = Connection::connect(url, ConnectionProperties::default())
            .await
            .map_err(|e| BrokerError::Connection(e.into()))?;
        info!("connected to message broker");
        Ok(Self { connection })
    }

    /// A publisher on its own channel, with publisher confirms enabled.
    pub async fn publisher(&self) -> Result<AmqpPublisher, BrokerError> {
        let channel = self.channel().await?;
        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(|e| BrokerError::Connection(e.into()))?;
        Ok(AmqpPublisher {
            channel,
            declared: Mutex::new(HashSet::new()),
        })
    }

    pub async fn subscriber(&self) -> Result<AmqpSubscriber, BrokerError> {
        let channel = self.channel().await?;
        channel
            .basic_qos(DEFAULT_PREFETCH, BasicQosOptions::default())
            .await
            .map_err(|e| BrokerError::Connection(e.into()))?;
        Ok(AmqpSubscriber { channel })
    }

    pub async fn close(&self) -> Result<(), BrokerError> {
        self.connection
            .close(200, "shutdown")
            .await
            .map_err(|e| BrokerError::Connection(e.into()))
    }

    async fn channel(&self) -> Result<Channel, BrokerError> {
        self.connection
            .create_channel()
            .await
            .map_err(|e| BrokerError::Connection(e.into()))
    }
}

async fn declare_queue(channel: &Channel, queue: &str) -> Result<(), lapin::Error> {
    channel
        .queue_declare(
            queue,
            QueueDeclareOptions {
                durable: true,
                exclusive: false,
                auto_delete: false,
                ..QueueDeclareOptions::default()
            },
            FieldTable::default(),
        )
        .await?;
    Ok(())
}

pub struct AmqpPublisher {
    channel: Channel,
    declared: Mutex<HashSet<String>>,
}

impl AmqpPublisher {
    fn is_declared(&self, queue: &str) -> bool {
        self.declared
            .lock()
            .map(|set| set.contains(queue))
            .unwrap_or(false)
    }

    fn mark_declared(&self, queue: &str) {
        if let Ok(mut set) = self.declared.lock() {
            set.insert(queue.to_owned());
        }
    }
}

#[async_trait::async_trait]
impl Publisher for AmqpPublisher {
    async fn publish(&self, queue: &str, message: BusMessage) -> Result<(), BrokerError> {
        let failed = |e: lapin::Error| BrokerError::Publish {
            queue: queue.to_owned(),
            source: e.into(),
        };

        if !self.is_declared(queue) {
            declare_queue(&self.channel, queue).await.map_err(failed)?;
            self.mark_declared(queue);
        }

        let properties = BasicProperties::default()
            .with_content_type(ShortString::from(message.content_type.clone()))
            .with_delivery_mode(PERSISTENT)
            .with_headers(to_field_table(&message.headers));

        let confirmation = self
            .channel
            .basic_publish(
                "",
                queue,
                BasicPublishOptions {
                    mandatory: false,
                    immediate: false,
                },
                &message.body,
                properties,
            )
            .await
            .map_err(failed)?
            .await
            .map_err(failed)?;

        if confirmation.is_nack() {
            return Err(BrokerError::Publish {
                queue: queue.to_owned(),
                source: anyhow::anyhow!("broker refused message"),
            });
        }
        debug!(queue, message_id = message.message_id(), "message published");
        Ok(())
    }
}

pub struct AmqpSubscriber {
    channel: Channel,
}

#[async_trait::async_trait]
impl Subscriber for AmqpSubscriber {
    async fn subscribe(&self, queue: &str) -> Result<DeliveryStream, BrokerError> {
        let failed = |e: lapin::Error| BrokerError::Subscribe {
            queue: queue.to_owned(),
            source: e.into(),
        };
        declare_queue(&self.channel, queue).await.map_err(failed)?;

        let consumer = self
            .channel
            .basic_consume(
                queue,
                &format!("skycast-{queue}-{}", uuid::Uuid::new_v4()),
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(failed)?;

        let stream = consumer.map(|delivery| match delivery {
            Ok(delivery) => Ok(into_delivery(delivery)),
            Err(e) => Err(BrokerError::Stream(e.into())),
        });
        Ok(stream.boxed())
    }
}

fn into_delivery(delivery: lapin::message::Delivery) -> Delivery {
    let lapin::message::Delivery {
        data,
        properties,
        acker,
        ..
    } = delivery;

    let headers = properties
        .headers()
        .as_ref()
        .map(from_field_table)
        .unwrap_or_default();
    let content_type = properties
        .content_type()
        .as_ref()
        .map(|ct| ct.as_str().to_owned())
        .unwrap_or_else(|| JSON_CONTENT_TYPE.to_owned());

    let message = BusMessage {
        headers,
        content_type,
        body: data,
    };
    Delivery::new(message, Box::new(AmqpAcker(acker)))
}

struct AmqpAcker(lapin::acker::Acker);

#[async_trait::async_trait]
impl Acker for AmqpAcker {
    async fn ack(&self) -> Result<(), BrokerError> {
        self.0
            .ack(BasicAckOptions::default())
            .await
            .map_err(|e| BrokerError::Ack(e.into()))
    }

    async fn nack(&self, requeue: bool) -> Result<(), BrokerError> {
        self.0
            .nack(BasicNackOptions {
                multiple: false,
                requeue,
            })
            .await
            .map_err(|e| BrokerError::Ack(e.into()))
    }
}

fn to_field_table(headers: &BTreeMap<String, String>) -> FieldTable {
    let mut table = FieldTable::default();
    for (name, value) in headers {
        table.insert(
            ShortString::from(name.clone()),
            AMQPValue::LongString(LongString::from(value.clone())),
        );
    }
    table
}

fn from_field_table(table: &FieldTable) -> BTreeMap<String, String> {
    table
        .inner()
        .iter()
        .filter_map(|(name, value)| header_value(value).map(|v| (name.as_str().to_owned(), v)))
        .collect()
}

fn header_value(value: &AMQPValue) -> Option<String> {
    match value {
        AMQPValue::LongString(s) => Some(String::from_utf8_lossy(s.as_bytes()).into_owned()),
        AMQPValue::ShortString(s) => Some(s.as_str().to_owned()),
        _ => None,
    }
}
