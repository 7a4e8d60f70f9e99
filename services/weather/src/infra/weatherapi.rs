//! WeatherAPI.com (keyed), used as the fallback provider and validator.

use chrono::NaiveDateTime;
use serde::Deserialize;
use skycast_domain::weather::{CurrentWeather, DailyForecast, HourlyForecast};

use crate::domain::provider::{CityValidator, ProviderError, WeatherReader};
use crate::infra::http::trim_base;

const PROVIDER: &str = "weatherapi";

/// Error code WeatherAPI returns (with HTTP 400) for an unknown location.
const NO_MATCHING_LOCATION: i32 = 1006;

const LOCAL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: i32,
    message: String,
}

#[derive(Debug, Deserialize)]
struct Condition {
    text: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct Location {
    name: String,
    localtime: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CurrentResponse {
    current: CurrentBlock,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    temp_c: f64,
    humidity: f64,
    condition: Condition,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ForecastResponse {
    location: Location,
    forecast: Forecast,
}

#[derive(Debug, Deserialize)]
struct Forecast {
    forecastday: Vec<ForecastDay>,
}

#[derive(Debug, Deserialize)]
struct ForecastDay {
    date: String,
    day: Day,
    #[serde(default)]
    hour: Vec<Hour>,
}

#[derive(Debug, Deserialize)]
struct Day {
    maxtemp_c: f64,
    mintemp_c: f64,
    avgtemp_c: f64,
    daily_will_it_rain: u8,
    daily_chance_of_rain: i32,
    daily_will_it_snow: u8,
    daily_chance_of_snow: i32,
    condition: Condition,
}

#[derive(Debug, Deserialize)]
struct Hour {
    time: String,
    temp_c: f64,
    will_it_rain: u8,
    chance_of_rain: i32,
    will_it_snow: u8,
    chance_of_snow: i32,
    condition: Condition,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchHit {
    name: String,
}

#[derive(Clone)]
pub struct WeatherApiClient {
    client: reqwest::Client,
    base_url: String,
    key: String,
}

impl WeatherApiClient {
    pub fn new(client: reqwest::Client, base_url: &str, key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: trim_base(base_url),
            key: key.into(),
        }
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        city: &str,
        extra: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let response = self
            .client
            .get(format!("{}/{endpoint}", self.base_url))
            .query(&[("key", self.key.as_str()), ("q", city)])
            .query(extra)
            .send()
            .await
            .map_err(|e| ProviderError::unavailable(PROVIDER, e))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ProviderError::unavailable(PROVIDER, e));
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_error(status, &body, city))
    }
}

fn classify_error(status: reqwest::StatusCode, body: &str, city: &str) -> ProviderError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(err) if err.error.code == NO_MATCHING_LOCATION => {
            ProviderError::CityNotFound(city.to_owned())
        }
        Ok(err) => ProviderError::unavailable(
            PROVIDER,
            anyhow::anyhow!("upstream returned {status}: {} ({})", err.error.message, err.error.code),
        ),
        Err(_) if status == reqwest::StatusCode::NOT_FOUND => {
            ProviderError::CityNotFound(city.to_owned())
        }
        Err(_) => ProviderError::unavailable(PROVIDER, anyhow::anyhow!("upstream returned {status}")),
    }
}

// ── Weather ──────────────────────────────────────────────────────────────────

pub struct WeatherApiProvider {
    api: WeatherApiClient,
}

impl WeatherApiProvider {
    pub fn new(api: WeatherApiClient) -> Self {
        Self { api }
    }
}

#[async_trait::async_trait]
impl WeatherReader for WeatherApiProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn current(&self, city: &str) -> Result<CurrentWeather, ProviderError> {
        let response: CurrentResponse = self.api.get("current.json", city, &[]).await?;
        Ok(current_from(response))
    }

    async fn daily(&self, city: &str) -> Result<DailyForecast, ProviderError> {
        let response: ForecastResponse = self
            .api
            .get("forecast.json", city, &[("days", "1")])
            .await?;
        daily_from(response).map_err(|e| ProviderError::unavailable(PROVIDER, e))
    }

    async fn hourly(&self, city: &str) -> Result<HourlyForecast, ProviderError> {
        let response: ForecastResponse = self
            .api
            .get("forecast.json", city, &[("days", "2")])
            .await?;
        hourly_from(response).map_err(|e| ProviderError::unavailable(PROVIDER, e))
    }
}

pub(crate) fn current_from(response: CurrentResponse) -> CurrentWeather {
    CurrentWeather {
        temperature: response.current.temp_c,
        humidity: response.current.humidity,
        description: response.current.condition.text,
    }
}

pub(crate) fn daily_from(response: ForecastResponse) -> anyhow::Result<DailyForecast> {
    let location = response.location.name;
    let today = response
        .forecast
        .forecastday
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("forecast has no days"))?;
    let day = today.day;
    Ok(DailyForecast {
        location,
        date: today.date,
        max_temp_c: day.maxtemp_c,
        min_temp_c: day.mintemp_c,
        avg_temp_c: day.avgtemp_c,
        will_it_rain: day.daily_will_it_rain == 1,
        chance_rain: day.daily_chance_of_rain,
        will_it_snow: day.daily_will_it_snow == 1,
        chance_snow: day.daily_chance_of_snow,
        condition: day.condition.text,
        icon: day.condition.icon,
    })
}

/// The first forecast hour strictly after the location's local time.
pub(crate) fn hourly_from(response: ForecastResponse) -> anyhow::Result<HourlyForecast> {
    let location = response.location.name;
    let local_now = NaiveDateTime::parse_from_str(&response.location.localtime, LOCAL_TIME_FORMAT)?;

    let hour = response
        .forecast
        .forecastday
        .into_iter()
        .flat_map(|day| day.hour)
        .find(|hour| {
            NaiveDateTime::parse_from_str(&hour.time, LOCAL_TIME_FORMAT)
                .is_ok_and(|t| t > local_now)
        })
        .ok_or_else(|| anyhow::anyhow!("no forecast hour after {local_now}"))?;

    Ok(HourlyForecast {
        location,
        time: hour.time,
        temp_c: hour.temp_c,
        will_it_rain: hour.will_it_rain == 1,
        chance_rain: hour.chance_of_rain,
        will_it_snow: hour.will_it_snow == 1,
        chance_snow: hour.chance_of_snow,
        condition: hour.condition.text,
        icon: hour.condition.icon,
    })
}

// ── Validator ────────────────────────────────────────────────────────────────

/// Canonical city name from the first `search.json` match.
pub struct WeatherApiValidator {
    api: WeatherApiClient,
}

impl WeatherApiValidator {
    pub fn new(api: WeatherApiClient) -> Self {
        Self { api }
    }
}

#[async_trait::async_trait]
impl CityValidator for WeatherApiValidator {
    fn name(&self) -> &'static str {
        "weatherapi-search"
    }

    async fn validate(&self, city: &str) -> Result<String, ProviderError> {
        let hits: Vec<SearchHit> = self.api.get("search.json", city, &[]).await?;
        first_hit(hits, city)
    }
}

pub(crate) fn first_hit(hits: Vec<SearchHit>, city: &str) -> Result<String, ProviderError> {
    hits.into_iter()
        .next()
        .map(|hit| hit.name)
        .ok_or_else(|| ProviderError::CityNotFound(city.to_owned()))
}
