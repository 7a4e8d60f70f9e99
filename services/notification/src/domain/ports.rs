use skycast_domain::subscription::Frequency;
use skycast_domain::weather::Forecast;

use crate::error::NotificationServiceError;

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<(), NotificationServiceError>;
}

/// Forecast lookups for weather update emails.
#[async_trait::async_trait]
pub trait WeatherPort: Send + Sync {
    /// Daily subscribers get today's aggregate, hourly ones the next hour.
    async fn forecast(
        &self,
        city: &str,
        frequency: Frequency,
    ) -> Result<Forecast, NotificationServiceError>;
}
