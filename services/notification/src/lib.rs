pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod render;
pub mod router;
pub mod usecase;
