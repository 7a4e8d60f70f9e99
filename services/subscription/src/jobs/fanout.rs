use std::sync::Arc;
use std::time::Duration;

use skycast_domain::event::Event;
use skycast_domain::subscription::{Frequency, Subscription};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::domain::repository::{ConfirmedSubscriptions, OutboxWriter};
use crate::error::SubscriptionServiceError;
use crate::events::WriterDispatcher;
use crate::jobs::stream::{PAGE_SIZE, open_stream};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FanoutReport {
    pub dispatched: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum FanoutError {
    #[error("fan-out cancelled")]
    Cancelled,
    #[error("fan-out exceeded its deadline")]
    DeadlineExceeded,
    #[error("subscription stream failed")]
    Stream(#[source] SubscriptionServiceError),
    #[error("{failed} weather updates failed to dispatch ({dispatched} dispatched)")]
    Partial { dispatched: usize, failed: usize },
}

/// Emits one `weather_updated` event per confirmed subscription of a
/// frequency.
pub struct FanoutExecutor<S: ConfirmedSubscriptions> {
    source: Arc<S>,
    dispatcher: Arc<WriterDispatcher>,
    writer: Arc<dyn OutboxWriter>,
    timeout: Duration,
    page_size: u64,
}

impl<S: ConfirmedSubscriptions> FanoutExecutor<S> {
    pub fn new(
        source: Arc<S>,
        dispatcher: Arc<WriterDispatcher>,
        writer: Arc<dyn OutboxWriter>,
    ) -> Self {
        Self {
            source,
            dispatcher,
            writer,
            timeout: DEFAULT_TIMEOUT,
            page_size: PAGE_SIZE,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    /// One fan-out run. Individual dispatch failures do not stop the run;
    /// they are aggregated into [`FanoutError::Partial`] at the end.
    #[tracing::instrument(name = "fanout", skip_all, fields(%frequency))]
    pub async fn run(
        &self,
        frequency: Frequency,
        cancel: &CancellationToken,
    ) -> Result<FanoutReport, FanoutError> {
        // Stops the producer on every exit path.
        let producer_cancel = cancel.child_token();
        let _stop_producer = producer_cancel.clone().drop_guard();

        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        let stream = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(FanoutError::Cancelled),
            () = &mut deadline => return Err(FanoutError::DeadlineExceeded),
            opened = open_stream(self.source.clone(), frequency, self.page_size, producer_cancel) => {
                opened.map_err(FanoutError::Stream)?
            }
        };
        let mut items = Some(stream.items);
        let mut errors = Some(stream.errors);
        let mut stream_error = None;
        let mut dispatched = 0usize;
        let mut failed = 0usize;

        while items.is_some() || errors.is_some() {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(FanoutError::Cancelled),
                () = &mut deadline => return Err(FanoutError::DeadlineExceeded),
                item = recv(&mut items), if items.is_some() => match item {
                    Some(subscription) => {
                        let outcome = tokio::select! {
                            biased;
                            () = cancel.cancelled() => return Err(FanoutError::Cancelled),
                            () = &mut deadline => return Err(FanoutError::DeadlineExceeded),
                            outcome = self.dispatch(&subscription) => outcome,
                        };
                        match outcome {
                            Ok(()) => dispatched += 1,
                            Err(e) => {
                                warn!(
                                    subscription_id = %subscription.id,
                                    city = %subscription.city,
                                    error = ?e,
                                    "weather update dispatch failed"
                                );
                                failed += 1;
                            }
                        }
                    }
                    None => items = None,
                },
                error = recv(&mut errors), if errors.is_some() => match error {
                    Some(e) => stream_error = Some(e),
                    None => errors = None,
                },
            }
        }

        if let Some(e) = stream_error {
            return Err(FanoutError::Stream(e));
        }
        if failed > 0 {
            return Err(FanoutError::Partial { dispatched, failed });
        }
        info!(dispatched, "fan-out finished");
        Ok(FanoutReport { dispatched })
    }

    async fn dispatch(&self, subscription: &Subscription) -> Result<(), SubscriptionServiceError> {
        self.dispatcher
            .dispatch(self.writer.as_ref(), &Event::weather_updated(subscription))
            .await?;
        Ok(())
    }
}

async fn recv<T>(rx: &mut Option<mpsc::Receiver<T>>) -> Option<T> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
