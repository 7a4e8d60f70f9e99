//! Cache port, metrics recorder and the forecast-aware TTL policy.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Timelike};
use skycast_domain::weather::ForecastType;

pub const CURRENT_TTL: Duration = Duration::from_secs(15 * 60);
pub const VALIDATOR_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const FALLBACK_TTL: Duration = Duration::from_secs(60);

/// Metric label of the weather cache proxies.
pub const WEATHER_CACHE: &str = "weather";
/// Metric label of the validator cache proxies.
pub const VALIDATOR_CACHE: &str = "validator";

#[derive(Debug, thiserror::Error)]
#[error("cache unavailable")]
pub struct CacheError(#[source] pub anyhow::Error);

#[async_trait::async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
}

/// Hit/miss recorder injected into the cache proxies.
pub trait CacheMetrics: Send + Sync {
    fn hit(&self, cache: &str);
    fn miss(&self, cache: &str);
}

/// Recorder that drops every observation.
pub struct NoopCacheMetrics;

impl CacheMetrics for NoopCacheMetrics {
    fn hit(&self, _cache: &str) {}
    fn miss(&self, _cache: &str) {}
}

pub fn weather_key(prefix: &str, forecast: ForecastType, city: &str) -> String {
    format!("{prefix}:{forecast}:{}", city.trim().to_lowercase())
}

pub fn validator_key(prefix: &str, city: &str) -> String {
    format!("{prefix}:{}", city.trim().to_lowercase())
}

/// How long a `forecast` fetched at `now` stays fresh: current conditions for
/// a fixed window, hourly data until the next hour, daily data until the next
/// midnight in `now`'s time zone.
pub fn ttl_for<Tz: TimeZone>(forecast: ForecastType, now: &DateTime<Tz>) -> Duration {
    match forecast {
        ForecastType::Current => CURRENT_TTL,
        ForecastType::Hourly => {
            let elapsed = u64::from(now.minute() * 60 + now.second());
            Duration::from_secs(3600 - elapsed)
        }
        ForecastType::Daily => until_midnight(now).unwrap_or(FALLBACK_TTL),
    }
}

fn until_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> Option<Duration> {
    let local = now.naive_local();
    let midnight = local.date().succ_opt()?.and_hms_opt(0, 0, 0)?;
    let secs = (midnight - local).num_seconds().max(1);
    Some(Duration::from_secs(u64::try_from(secs).ok()?))
}
