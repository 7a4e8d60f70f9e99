use std::future::Future;

use skycast_domain::subscription::{Frequency, Subscription};
use skycast_messaging::outbox::NewOutboxMessage;
use uuid::Uuid;

use crate::error::SubscriptionServiceError;

/// Subscription persistence, bound to one connection or transaction.
pub trait SubscriptionRepository: Send + Sync {
    fn exists_by_lookup(
        &self,
        email: &str,
        city: &str,
        frequency: Frequency,
    ) -> impl Future<Output = Result<bool, SubscriptionServiceError>> + Send;

    fn create(
        &self,
        subscription: &Subscription,
    ) -> impl Future<Output = Result<(), SubscriptionServiceError>> + Send;

    fn find_by_token(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Option<Subscription>, SubscriptionServiceError>> + Send;

    /// Persist the confirmation flag and `updated_at`.
    fn save_confirmation(
        &self,
        subscription: &Subscription,
    ) -> impl Future<Output = Result<(), SubscriptionServiceError>> + Send;

    fn delete(&self, id: Uuid) -> impl Future<Output = Result<(), SubscriptionServiceError>> + Send;
}

/// Inserts outbox rows. Implemented by transaction scopes and, for callers
/// without a transaction, by the pooled connection.
#[async_trait::async_trait]
pub trait OutboxWriter: Send + Sync {
    async fn save(&self, message: NewOutboxMessage) -> Result<(), SubscriptionServiceError>;
}

/// One open database transaction. Dropping the scope without
/// [`SubscriptionScope::commit`] rolls every write back.
pub trait SubscriptionScope: SubscriptionRepository + OutboxWriter + Sized + 'static {
    fn commit(self) -> impl Future<Output = Result<(), SubscriptionServiceError>> + Send;
}

/// Opens transaction scopes.
pub trait UnitOfWork: Send + Sync {
    type Scope: SubscriptionScope;

    fn begin(&self) -> impl Future<Output = Result<Self::Scope, SubscriptionServiceError>> + Send;
}

/// Position after the last row of a page of confirmed subscriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    pub city: String,
    pub id: Uuid,
}

impl PageCursor {
    pub fn after(subscription: &Subscription) -> Self {
        Self {
            city: subscription.city.clone(),
            id: subscription.id,
        }
    }
}

/// Keyset-paginated scan of confirmed subscriptions ordered by `(city, id)`.
pub trait ConfirmedSubscriptions: Send + Sync + 'static {
    fn confirmed_page(
        &self,
        frequency: Frequency,
        after: Option<PageCursor>,
        limit: u64,
    ) -> impl Future<Output = Result<Vec<Subscription>, SubscriptionServiceError>> + Send;
}

/// Canonicalises user-supplied city names.
pub trait CityValidatorPort: Send + Sync {
    fn validate(
        &self,
        city: &str,
    ) -> impl Future<Output = Result<String, SubscriptionServiceError>> + Send;
}
