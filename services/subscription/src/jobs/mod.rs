//! Background work: the confirmed-subscription stream, the fan-out executor
//! and the cron scheduler driving both jobs plus the outbox relay.

pub mod fanout;
pub mod scheduler;
pub mod stream;
