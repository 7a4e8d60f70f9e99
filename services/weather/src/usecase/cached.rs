//! Read-through cache proxies wrapped around each leaf provider.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use serde::Serialize;
use serde::de::DeserializeOwned;
use skycast_domain::weather::{CurrentWeather, DailyForecast, ForecastType, HourlyForecast};
use tracing::{debug, warn};

use crate::domain::cache::{
    Cache, CacheMetrics, VALIDATOR_CACHE, VALIDATOR_TTL, WEATHER_CACHE, ttl_for, validator_key,
    weather_key,
};
use crate::domain::provider::{CityValidator, ProviderError, WeatherReader};

/// Look `key` up in `cache`. Read failures and undecodable entries count as
/// misses.
async fn lookup<T: DeserializeOwned>(cache: &dyn Cache, key: &str) -> Option<T> {
    match cache.get(key).await {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "discarding undecodable cache entry");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!(key, error = ?e, "cache read failed");
            None
        }
    }
}

/// Store `value` under `key`. Failures are logged and swallowed.
async fn store<T: Serialize>(cache: &dyn Cache, key: &str, value: &T, ttl: Duration) {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(key, error = %e, "failed to encode cache entry");
            return;
        }
    };
    if let Err(e) = cache.set(key, &raw, ttl).await {
        warn!(key, error = ?e, "cache write failed");
    }
}

// ── CachedWeatherReader ──────────────────────────────────────────────────────

pub struct CachedWeatherReader {
    inner: Arc<dyn WeatherReader>,
    cache: Arc<dyn Cache>,
    metrics: Arc<dyn CacheMetrics>,
    prefix: String,
}

impl CachedWeatherReader {
    pub fn new(
        inner: Arc<dyn WeatherReader>,
        cache: Arc<dyn Cache>,
        metrics: Arc<dyn CacheMetrics>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            cache,
            metrics,
            prefix: prefix.into(),
        }
    }

    async fn read_through<T, F>(
        &self,
        forecast: ForecastType,
        city: &str,
        load: F,
    ) -> Result<T, ProviderError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: Future<Output = Result<T, ProviderError>> + Send,
    {
        let key = weather_key(&self.prefix, forecast, city);
        if let Some(value) = lookup(self.cache.as_ref(), &key).await {
            self.metrics.hit(WEATHER_CACHE);
            debug!(key, "cache hit");
            return Ok(value);
        }
        self.metrics.miss(WEATHER_CACHE);

        let value = load.await?;
        store(
            self.cache.as_ref(),
            &key,
            &value,
            ttl_for(forecast, &Local::now()),
        )
        .await;
        Ok(value)
    }
}

#[async_trait::async_trait]
impl WeatherReader for CachedWeatherReader {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn current(&self, city: &str) -> Result<CurrentWeather, ProviderError> {
        self.read_through(ForecastType::Current, city, self.inner.current(city))
            .await
    }

    async fn daily(&self, city: &str) -> Result<DailyForecast, ProviderError> {
        self.read_through(ForecastType::Daily, city, self.inner.daily(city))
            .await
    }

    async fn hourly(&self, city: &str) -> Result<HourlyForecast, ProviderError> {
        self.read_through(ForecastType::Hourly, city, self.inner.hourly(city))
            .await
    }
}

// ── CachedCityValidator ──────────────────────────────────────────────────────

pub struct CachedCityValidator {
    inner: Arc<dyn CityValidator>,
    cache: Arc<dyn Cache>,
    metrics: Arc<dyn CacheMetrics>,
    prefix: String,
}

impl CachedCityValidator {
    pub fn new(
        inner: Arc<dyn CityValidator>,
        cache: Arc<dyn Cache>,
        metrics: Arc<dyn CacheMetrics>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            cache,
            metrics,
            prefix: prefix.into(),
        }
    }
}

#[async_trait::async_trait]
impl CityValidator for CachedCityValidator {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn validate(&self, city: &str) -> Result<String, ProviderError> {
        let key = validator_key(&self.prefix, city);
        if let Some(canonical) = lookup::<String>(self.cache.as_ref(), &key).await {
            self.metrics.hit(VALIDATOR_CACHE);
            return Ok(canonical);
        }
        self.metrics.miss(VALIDATOR_CACHE);

        let canonical = self.inner.validate(city).await?;
        store(self.cache.as_ref(), &key, &canonical, VALIDATOR_TTL).await;
        Ok(canonical)
    }
}
