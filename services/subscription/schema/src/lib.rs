pub mod outbox;
pub mod subscriptions;
