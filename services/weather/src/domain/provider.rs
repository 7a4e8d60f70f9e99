use std::sync::Arc;

use skycast_domain::weather::{CurrentWeather, DailyForecast, HourlyForecast};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("city not found: {0}")]
    CityNotFound(String),
    #[error("{provider} unavailable")]
    Unavailable {
        provider: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ProviderError {
    pub fn unavailable(provider: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Unavailable {
            provider,
            source: source.into(),
        }
    }
}

/// Weather lookups for a city. Implemented by upstream providers, their
/// cache proxies and the provider chain alike.
#[async_trait::async_trait]
pub trait WeatherReader: Send + Sync {
    fn name(&self) -> &'static str;

    async fn current(&self, city: &str) -> Result<CurrentWeather, ProviderError>;

    async fn daily(&self, city: &str) -> Result<DailyForecast, ProviderError>;

    async fn hourly(&self, city: &str) -> Result<HourlyForecast, ProviderError>;
}

/// Resolves a user-supplied city to its canonical spelling.
#[async_trait::async_trait]
pub trait CityValidator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn validate(&self, city: &str) -> Result<String, ProviderError>;
}

#[async_trait::async_trait]
impl<T: WeatherReader + ?Sized> WeatherReader for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn current(&self, city: &str) -> Result<CurrentWeather, ProviderError> {
        (**self).current(city).await
    }

    async fn daily(&self, city: &str) -> Result<DailyForecast, ProviderError> {
        (**self).daily(city).await
    }

    async fn hourly(&self, city: &str) -> Result<HourlyForecast, ProviderError> {
        (**self).hourly(city).await
    }
}

#[async_trait::async_trait]
impl<T: CityValidator + ?Sized> CityValidator for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn validate(&self, city: &str) -> Result<String, ProviderError> {
        (**self).validate(city).await
    }
}
