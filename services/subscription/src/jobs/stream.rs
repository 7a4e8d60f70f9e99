use std::sync::Arc;

use skycast_domain::subscription::{Frequency, Subscription};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::repository::{ConfirmedSubscriptions, PageCursor};
use crate::error::SubscriptionServiceError;

pub const PAGE_SIZE: u64 = 100;
pub const ITEM_CAPACITY: usize = 64;

/// Confirmed subscriptions of one frequency, ordered by `(city, id)`.
///
/// `items` closes once the producer is done; a failure after the first page
/// arrives on `errors`, which then closes too. Both must be drained.
pub struct SubscriptionStream {
    pub items: mpsc::Receiver<Subscription>,
    pub errors: mpsc::Receiver<SubscriptionServiceError>,
}

/// Fetch the first page, then hand the remaining pages to a producer task.
/// An error while fetching the first page is returned directly.
pub async fn open_stream<S: ConfirmedSubscriptions>(
    source: Arc<S>,
    frequency: Frequency,
    page_size: u64,
    cancel: CancellationToken,
) -> Result<SubscriptionStream, SubscriptionServiceError> {
    let page_size = page_size.max(1);
    let first = source.confirmed_page(frequency, None, page_size).await?;

    let (items_tx, items) = mpsc::channel(ITEM_CAPACITY);
    let (errors_tx, errors) = mpsc::channel(1);
    tokio::spawn(produce(
        source, frequency, page_size, first, items_tx, errors_tx, cancel,
    ));
    Ok(SubscriptionStream { items, errors })
}

async fn produce<S: ConfirmedSubscriptions>(
    source: Arc<S>,
    frequency: Frequency,
    page_size: u64,
    first: Vec<Subscription>,
    items: mpsc::Sender<Subscription>,
    errors: mpsc::Sender<SubscriptionServiceError>,
    cancel: CancellationToken,
) {
    let mut page = first;
    let mut produced = 0usize;
    loop {
        let last_page = (page.len() as u64) < page_size;
        let cursor = page.last().map(PageCursor::after);
        for subscription in page {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                sent = items.send(subscription) => {
                    if sent.is_err() {
                        return;
                    }
                    produced += 1;
                }
            }
        }
        if last_page {
            break;
        }
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            next = source.confirmed_page(frequency, cursor, page_size) => next,
        };
        match next {
            Ok(next) => page = next,
            Err(e) => {
                let _ = errors.try_send(e);
                return;
            }
        }
    }
    debug!(%frequency, produced, "subscription stream drained");
}
