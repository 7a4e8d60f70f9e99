//! Back-end services the gateway forwards to.
//!
//! Errors are already translated into [`AppError`], so handlers only
//! validate input and shape the response.

use skycast_core::error::AppError;
use skycast_domain::weather::{CurrentWeather, DailyForecast, HourlyForecast};

/// Subscribe form as accepted at the edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeRequest {
    pub email: String,
    pub city: String,
    pub frequency: String,
}

/// Each call returns the back-end's human-readable message.
#[async_trait::async_trait]
pub trait SubscriptionBackend: Send + Sync {
    async fn subscribe(&self, request: SubscribeRequest) -> Result<String, AppError>;
    async fn confirm(&self, token: &str) -> Result<String, AppError>;
    async fn unsubscribe(&self, token: &str) -> Result<String, AppError>;
}

#[async_trait::async_trait]
pub trait WeatherBackend: Send + Sync {
    async fn current(&self, city: &str) -> Result<CurrentWeather, AppError>;
    async fn daily(&self, city: &str) -> Result<DailyForecast, AppError>;
    async fn hourly(&self, city: &str) -> Result<HourlyForecast, AppError>;
    /// Canonical spelling of `city`.
    async fn validate_city(&self, city: &str) -> Result<String, AppError>;
}
