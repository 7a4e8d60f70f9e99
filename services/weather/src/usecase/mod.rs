pub mod cached;
pub mod chain;
pub mod weather;
