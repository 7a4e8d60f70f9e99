//! In-process event routing.
//!
//! A dispatcher is parameterised by the context its handlers receive: the
//! request path passes the open unit of work so that outbox rows are written
//! in the caller's transaction, the fan-out path passes `()` and handlers
//! publish directly.

use std::sync::Arc;

use skycast_domain::event::{Event, EventName};
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("no handler registered for event {0}")]
    NoHandler(EventName),
    #[error("failed to encode event {0}")]
    Encode(EventName, #[source] serde_json::Error),
    #[error("failed to handle event {0}")]
    Handler(EventName, #[source] anyhow::Error),
}

#[async_trait::async_trait]
pub trait EventHandler<C: ?Sized + Sync>: Send + Sync {
    fn can_handle(&self, name: EventName) -> bool;

    async fn handle(&self, ctx: &C, event: &Event) -> Result<(), DispatchError>;
}

/// Immutable list of handlers; the first one that accepts an event wins.
pub struct EventDispatcher<C: ?Sized> {
    handlers: Vec<Arc<dyn EventHandler<C>>>,
}

impl<C: ?Sized + Sync> Default for EventDispatcher<C> {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }
}

impl<C: ?Sized + Sync> EventDispatcher<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, handler: impl EventHandler<C> + 'static) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    pub async fn dispatch(&self, ctx: &C, event: &Event) -> Result<(), DispatchError> {
        let name = event.name();
        let Some(handler) = self.handlers.iter().find(|h| h.can_handle(name)) else {
            error!(event = %name, "no handler registered");
            return Err(DispatchError::NoHandler(name));
        };
        handler.handle(ctx, event).await
    }
}
