pub mod config;
pub mod domain;
pub mod handlers;
pub mod infra;
pub mod router;
pub mod state;
