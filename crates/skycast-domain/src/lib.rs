//! Domain types shared across all Skycast services.
//!
//! This crate contains only pure types with no framework dependencies.
//! Import in `usecase/` and `domain/` layers as well as in message codecs.

pub mod event;
pub mod messages;
pub mod subscription;
pub mod weather;
