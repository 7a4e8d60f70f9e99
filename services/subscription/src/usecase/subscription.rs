use std::sync::Arc;

use skycast_domain::event::Event;
use skycast_domain::subscription::{Frequency, Subscription, is_valid_email};
use tracing::info;

use crate::domain::repository::{
    CityValidatorPort, OutboxWriter, SubscriptionRepository, SubscriptionScope, UnitOfWork,
};
use crate::error::SubscriptionServiceError;
use crate::events::WriterDispatcher;

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, SubscriptionServiceError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(SubscriptionServiceError::invalid(format!(
            "{field} is required"
        )));
    }
    Ok(value)
}

// ── Subscribe ────────────────────────────────────────────────────────────────

pub struct SubscribeInput {
    pub email: String,
    pub city: String,
    pub frequency: String,
}

pub struct SubscribeUseCase<U: UnitOfWork, V: CityValidatorPort> {
    pub uow: U,
    pub validator: V,
    pub dispatcher: Arc<WriterDispatcher>,
}

impl<U: UnitOfWork, V: CityValidatorPort> SubscribeUseCase<U, V> {
    /// Create an unconfirmed subscription and its `user_subscribed` outbox
    /// row in one transaction.
    pub async fn execute(
        &self,
        input: SubscribeInput,
    ) -> Result<Subscription, SubscriptionServiceError> {
        let email = required(&input.email, "email")?;
        let city = required(&input.city, "city")?;
        let frequency: Frequency = required(&input.frequency, "frequency")?.parse()?;
        if !is_valid_email(email) {
            return Err(SubscriptionServiceError::invalid("Invalid email"));
        }

        let canonical = self.validator.validate(city).await?;
        let subscription = Subscription::new(email, &canonical, frequency)?;

        let scope = self.uow.begin().await?;
        if scope
            .exists_by_lookup(&subscription.email, &subscription.city, frequency)
            .await?
        {
            return Err(SubscriptionServiceError::AlreadySubscribed);
        }
        scope.create(&subscription).await?;
        self.dispatcher
            .dispatch(&scope as &dyn OutboxWriter, &Event::user_subscribed(&subscription))
            .await?;
        scope.commit().await?;

        info!(
            subscription_id = %subscription.id,
            city = %subscription.city,
            frequency = %frequency,
            "subscription created"
        );
        Ok(subscription)
    }
}

// ── Confirm ──────────────────────────────────────────────────────────────────

pub struct ConfirmUseCase<U: UnitOfWork> {
    pub uow: U,
}

impl<U: UnitOfWork> ConfirmUseCase<U> {
    pub async fn execute(&self, token: &str) -> Result<(), SubscriptionServiceError> {
        let token = required(token, "token")?;
        let scope = self.uow.begin().await?;
        let mut subscription = scope
            .find_by_token(token)
            .await?
            .ok_or(SubscriptionServiceError::TokenNotFound)?;
        if !subscription.confirmed {
            subscription.confirm();
            scope.save_confirmation(&subscription).await?;
        }
        scope.commit().await?;
        info!(subscription_id = %subscription.id, "subscription confirmed");
        Ok(())
    }
}

// ── Unsubscribe ──────────────────────────────────────────────────────────────

pub struct UnsubscribeUseCase<U: UnitOfWork> {
    pub uow: U,
}

impl<U: UnitOfWork> UnsubscribeUseCase<U> {
    pub async fn execute(&self, token: &str) -> Result<(), SubscriptionServiceError> {
        let token = required(token, "token")?;
        let scope = self.uow.begin().await?;
        let subscription = scope
            .find_by_token(token)
            .await?
            .ok_or(SubscriptionServiceError::TokenNotFound)?;
        scope.delete(subscription.id).await?;
        scope.commit().await?;
        info!(subscription_id = %subscription.id, "subscription removed");
        Ok(())
    }
}
