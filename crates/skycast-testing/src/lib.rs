//! Test utilities for Skycast services.
//!
//! Provides the provider fixture loader, a throwaway HTTP upstream and
//! subscription factories. Use from `[dev-dependencies]` only.

pub mod factory;
pub mod fixture;
pub mod upstream;
