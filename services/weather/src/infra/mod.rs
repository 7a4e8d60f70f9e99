pub mod cache;
pub mod http;
pub mod metrics;
pub mod open_meteo;
pub mod weatherapi;
pub mod wmo;
