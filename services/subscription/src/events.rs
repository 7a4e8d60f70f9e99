//! Writer-side event handlers.
//!
//! `user_subscribed` must never be lost, so it is written to the outbox in
//! the caller's transaction and published later by the relay.
//! `weather_updated` is re-emitted by the next fan-out run anyway and is
//! published straight to the bus.

use std::sync::Arc;

use skycast_domain::event::{Event, EventName};
use skycast_domain::messages::{UserSubscribedMessage, WeatherUpdatedMessage};
use skycast_messaging::dispatcher::{DispatchError, EventDispatcher, EventHandler};
use skycast_messaging::outbox::NewOutboxMessage;
use skycast_messaging::{BusMessage, Publisher};
use tracing::debug;
use uuid::Uuid;

use crate::domain::repository::OutboxWriter;
use crate::links::LinkBuilder;

/// Dispatcher whose handlers receive the active outbox writer.
pub type WriterDispatcher = EventDispatcher<dyn OutboxWriter>;

pub fn writer_dispatcher(links: LinkBuilder, publisher: Arc<dyn Publisher>) -> WriterDispatcher {
    EventDispatcher::new()
        .register(OutboxEventHandler {
            links: links.clone(),
        })
        .register(PublishEventHandler { links, publisher })
}

fn unexpected(handler: &str, event: &Event) -> DispatchError {
    DispatchError::Handler(
        event.name(),
        anyhow::anyhow!("{handler} cannot handle {}", event.name()),
    )
}

// ── OutboxEventHandler ───────────────────────────────────────────────────────

pub struct OutboxEventHandler {
    pub links: LinkBuilder,
}

#[async_trait::async_trait]
impl EventHandler<dyn OutboxWriter> for OutboxEventHandler {
    fn can_handle(&self, name: EventName) -> bool {
        name == EventName::UserSubscribed
    }

    async fn handle(&self, outbox: &dyn OutboxWriter, event: &Event) -> Result<(), DispatchError> {
        let Event::UserSubscribed(payload) = event else {
            return Err(unexpected("outbox handler", event));
        };
        let message_id = Uuid::new_v4();
        let body = UserSubscribedMessage {
            message_id,
            email: payload.email.clone(),
            city: payload.city.clone(),
            frequency: payload.frequency,
            url: self.links.confirm(&payload.token),
        };
        let row = NewOutboxMessage::new(payload.id, event.name(), message_id, &body)
            .map_err(|e| DispatchError::Encode(event.name(), e))?;
        outbox
            .save(row)
            .await
            .map_err(|e| DispatchError::Handler(event.name(), anyhow::Error::new(e)))?;
        debug!(aggregate_id = %payload.id, %message_id, "user_subscribed written to outbox");
        Ok(())
    }
}

// ── PublishEventHandler ──────────────────────────────────────────────────────

pub struct PublishEventHandler {
    pub links: LinkBuilder,
    pub publisher: Arc<dyn Publisher>,
}

#[async_trait::async_trait]
impl EventHandler<dyn OutboxWriter> for PublishEventHandler {
    fn can_handle(&self, name: EventName) -> bool {
        name == EventName::WeatherUpdated
    }

    async fn handle(&self, _outbox: &dyn OutboxWriter, event: &Event) -> Result<(), DispatchError> {
        let Event::WeatherUpdated(payload) = event else {
            return Err(unexpected("publish handler", event));
        };
        let body = WeatherUpdatedMessage {
            email: payload.email.clone(),
            city: payload.city.clone(),
            frequency: payload.frequency,
            unsubscribe_url: self.links.unsubscribe(&payload.token),
        };
        let message = BusMessage::json(&body)
            .map_err(|e| DispatchError::Encode(event.name(), e))?
            .with_message_id(Uuid::new_v4());
        self.publisher
            .publish(event.name().queue(), message)
            .await
            .map_err(|e| DispatchError::Handler(event.name(), anyhow::Error::new(e)))
    }
}
