use skycast_domain::weather::{CurrentWeather, DailyForecast, HourlyForecast};

use crate::domain::provider::{CityValidator, WeatherReader};
use crate::error::WeatherServiceError;

fn require_city(city: &str) -> Result<&str, WeatherServiceError> {
    let city = city.trim();
    if city.is_empty() {
        return Err(WeatherServiceError::EmptyCity);
    }
    Ok(city)
}

// ── GetCurrent ───────────────────────────────────────────────────────────────

pub struct GetCurrentUseCase<R: WeatherReader> {
    pub reader: R,
}

impl<R: WeatherReader> GetCurrentUseCase<R> {
    pub async fn execute(&self, city: &str) -> Result<CurrentWeather, WeatherServiceError> {
        let city = require_city(city)?;
        Ok(self.reader.current(city).await?)
    }
}

// ── GetDaily ─────────────────────────────────────────────────────────────────

pub struct GetDailyUseCase<R: WeatherReader> {
    pub reader: R,
}

impl<R: WeatherReader> GetDailyUseCase<R> {
    pub async fn execute(&self, city: &str) -> Result<DailyForecast, WeatherServiceError> {
        let city = require_city(city)?;
        Ok(self.reader.daily(city).await?)
    }
}

// ── GetHourly ────────────────────────────────────────────────────────────────

pub struct GetHourlyUseCase<R: WeatherReader> {
    pub reader: R,
}

impl<R: WeatherReader> GetHourlyUseCase<R> {
    pub async fn execute(&self, city: &str) -> Result<HourlyForecast, WeatherServiceError> {
        let city = require_city(city)?;
        Ok(self.reader.hourly(city).await?)
    }
}

// ── ValidateCity ─────────────────────────────────────────────────────────────

pub struct ValidateCityUseCase<V: CityValidator> {
    pub validator: V,
}

impl<V: CityValidator> ValidateCityUseCase<V> {
    pub async fn execute(&self, city: &str) -> Result<String, WeatherServiceError> {
        let city = require_city(city)?;
        Ok(self.validator.validate(city).await?)
    }
}
