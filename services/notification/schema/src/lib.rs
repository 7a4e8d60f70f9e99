pub mod notification_idempotence;
