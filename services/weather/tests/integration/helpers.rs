use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use skycast_domain::weather::{CurrentWeather, DailyForecast, HourlyForecast};
use skycast_weather::domain::cache::{Cache, CacheError, CacheMetrics};
use skycast_weather::domain::provider::{CityValidator, ProviderError, WeatherReader};

pub fn london_current() -> CurrentWeather {
    CurrentWeather {
        temperature: 20.5,
        humidity: 70.0,
        description: "Partly Cloudy".into(),
    }
}

pub fn london_daily() -> DailyForecast {
    DailyForecast {
        location: "London".into(),
        date: "2026-10-19".into(),
        max_temp_c: 17.9,
        min_temp_c: 10.1,
        avg_temp_c: 13.8,
        will_it_rain: true,
        chance_rain: 87,
        will_it_snow: false,
        chance_snow: 0,
        condition: "Patchy rain nearby".into(),
        icon: "rain".into(),
    }
}

pub fn london_hourly() -> HourlyForecast {
    HourlyForecast {
        location: "London".into(),
        time: "2026-10-19 15:00".into(),
        temp_c: 17.2,
        will_it_rain: true,
        chance_rain: 75,
        will_it_snow: false,
        chance_snow: 0,
        condition: "Light rain shower".into(),
        icon: "rain".into(),
    }
}

#[derive(Clone, Copy)]
pub enum Behaviour {
    Succeed,
    NotFound,
    Unavailable,
}

impl Behaviour {
    fn fail(self, provider: &'static str, city: &str) -> Option<ProviderError> {
        match self {
            Self::Succeed => None,
            Self::NotFound => Some(ProviderError::CityNotFound(city.to_owned())),
            Self::Unavailable => Some(ProviderError::unavailable(
                provider,
                anyhow::anyhow!("connection reset"),
            )),
        }
    }
}

// ── StubReader ───────────────────────────────────────────────────────────────

pub struct StubReader {
    pub name: &'static str,
    pub behaviour: Behaviour,
    pub current: CurrentWeather,
    calls: AtomicUsize,
}

impl StubReader {
    pub fn new(name: &'static str, behaviour: Behaviour) -> Arc<Self> {
        Self::with_current(name, behaviour, london_current())
    }

    pub fn with_current(
        name: &'static str,
        behaviour: Behaviour,
        current: CurrentWeather,
    ) -> Arc<Self> {
        Arc::new(Self {
            name,
            behaviour,
            current,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self, city: &str) -> Result<(), ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behaviour.fail(self.name, city) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl WeatherReader for StubReader {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn current(&self, city: &str) -> Result<CurrentWeather, ProviderError> {
        self.record(city)?;
        Ok(self.current.clone())
    }

    async fn daily(&self, city: &str) -> Result<DailyForecast, ProviderError> {
        self.record(city)?;
        Ok(london_daily())
    }

    async fn hourly(&self, city: &str) -> Result<HourlyForecast, ProviderError> {
        self.record(city)?;
        Ok(london_hourly())
    }
}

// ── StubValidator ────────────────────────────────────────────────────────────

pub struct StubValidator {
    pub name: &'static str,
    pub behaviour: Behaviour,
    calls: AtomicUsize,
}

impl StubValidator {
    pub fn new(name: &'static str, behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            name,
            behaviour,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl CityValidator for StubValidator {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn validate(&self, city: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = self.behaviour.fail(self.name, city) {
            return Err(e);
        }
        let mut chars = city.trim().chars();
        Ok(match chars.next() {
            Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
            None => String::new(),
        })
    }
}

// ── CountingMetrics ──────────────────────────────────────────────────────────

#[derive(Default)]
pub struct CountingMetrics {
    hits: Mutex<HashMap<String, usize>>,
    misses: Mutex<HashMap<String, usize>>,
}

impl CountingMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn hits(&self, cache: &str) -> usize {
        self.hits.lock().unwrap().get(cache).copied().unwrap_or(0)
    }

    pub fn misses(&self, cache: &str) -> usize {
        self.misses.lock().unwrap().get(cache).copied().unwrap_or(0)
    }
}

impl CacheMetrics for CountingMetrics {
    fn hit(&self, cache: &str) {
        *self.hits.lock().unwrap().entry(cache.to_owned()).or_default() += 1;
    }

    fn miss(&self, cache: &str) {
        *self.misses.lock().unwrap().entry(cache.to_owned()).or_default() += 1;
    }
}

// ── InMemoryCache ────────────────────────────────────────────────────────────

/// Process-local [`Cache`] without expiry. Records the TTL of every write.
#[derive(Clone, Default)]
pub struct InMemoryCache {
    entries: Arc<Mutex<HashMap<String, (String, Duration)>>>,
    unavailable: Arc<Mutex<bool>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// TTL the entry under `key` was written with.
    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        self.lock_entries().get(key).map(|(_, ttl)| *ttl)
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.lock_entries().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn insert_raw(&self, key: &str, value: &str) {
        self.lock_entries()
            .insert(key.to_owned(), (value.to_owned(), Duration::ZERO));
    }

    /// Make every read and write fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap_or_else(|p| p.into_inner()) = unavailable;
    }

    fn is_unavailable(&self) -> bool {
        *self.unavailable.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, (String, Duration)>> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[async_trait::async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        if self.is_unavailable() {
            return Err(CacheError(anyhow::anyhow!("connection refused")));
        }
        Ok(self.lock_entries().get(key).map(|(v, _)| v.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        if self.is_unavailable() {
            return Err(CacheError(anyhow::anyhow!("connection refused")));
        }
        self.lock_entries()
            .insert(key.to_owned(), (value.to_owned(), ttl));
        Ok(())
    }
}
