//! Asynchronous delivery pipeline shared by the Skycast services.
//!
//! - [`outbox`] + [`relay`]: transactional outbox drained to the bus.
//! - [`dispatcher`]: in-process routing of domain events to handlers.
//! - [`consumer`]: plain and idempotent queue consumers.
//! - [`broker`] ports with an AMQP adapter ([`amqp`]).
//!
//! In-memory doubles live in `memory`, behind the `test-util` feature.

pub mod amqp;
pub mod broker;
pub mod consumer;
pub mod dispatcher;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod message;
pub mod outbox;
pub mod relay;

pub use broker::{BrokerError, Delivery, DeliveryStream, Publisher, Subscriber};
pub use message::{BusMessage, JSON_CONTENT_TYPE, MESSAGE_ID_HEADER};
