//! Shared plumbing for Skycast services: error kinds and their HTTP/gRPC
//! mapping, the error envelope, config loading, tracing, shutdown and
//! the `/metrics` and `/healthz` endpoints.

pub mod config;
pub mod error;
pub mod health;
pub mod metrics;
pub mod middleware;
pub mod serde;
pub mod shutdown;
pub mod tracing;
