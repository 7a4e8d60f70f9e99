//! Open-Meteo forecast and geocoding APIs (no API key).

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::Deserialize;
use skycast_domain::weather::{CurrentWeather, DailyForecast, HourlyForecast};

use crate::domain::provider::{CityValidator, ProviderError, WeatherReader};
use crate::infra::http::{fetch_json, trim_base};
use crate::infra::wmo;

const PROVIDER: &str = "open-meteo";
const GEOCODER: &str = "open-meteo-geocoding";

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,weather_code";
const HOURLY_FIELDS: &str = "temperature_2m,precipitation_probability,rain,snowfall,weather_code";
const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min,precipitation_probability_max,rain_sum,snowfall_sum,weather_code";

const HOUR_FORMAT: &str = "%Y-%m-%dT%H:%M";

// ── Geocoding ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Place {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodingResponse {
    #[serde(default)]
    results: Vec<Place>,
}

#[derive(Clone)]
pub struct GeocodingClient {
    client: reqwest::Client,
    base_url: String,
}

impl GeocodingClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: trim_base(base_url),
        }
    }

    pub async fn locate(&self, city: &str) -> Result<Place, ProviderError> {
        let request = self
            .client
            .get(format!("{}/v1/search", self.base_url))
            .query(&[("name", city), ("count", "1"), ("language", "en"), ("format", "json")]);
        let response: GeocodingResponse = fetch_json(GEOCODER, city, request).await?;
        first_place(response, city)
    }
}

pub(crate) fn first_place(response: GeocodingResponse, city: &str) -> Result<Place, ProviderError> {
    response
        .results
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::CityNotFound(city.to_owned()))
}

/// Canonical city name from the first geocoding match.
pub struct GeocodingValidator {
    geocoder: GeocodingClient,
}

impl GeocodingValidator {
    pub fn new(geocoder: GeocodingClient) -> Self {
        Self { geocoder }
    }
}

#[async_trait::async_trait]
impl CityValidator for GeocodingValidator {
    fn name(&self) -> &'static str {
        GEOCODER
    }

    async fn validate(&self, city: &str) -> Result<String, ProviderError> {
        Ok(self.geocoder.locate(city).await?.name)
    }
}

// ── Forecast ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct ForecastResponse {
    #[serde(default)]
    utc_offset_seconds: i64,
    current: Option<CurrentBlock>,
    hourly: Option<HourlyBlock>,
    daily: Option<DailyBlock>,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    temperature_2m: f64,
    relative_humidity_2m: f64,
    weather_code: u8,
}

#[derive(Debug, Deserialize)]
struct HourlyBlock {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_probability: Vec<Option<i32>>,
    #[serde(default)]
    rain: Vec<Option<f64>>,
    #[serde(default)]
    snowfall: Vec<Option<f64>>,
    weather_code: Vec<Option<u8>>,
}

#[derive(Debug, Deserialize)]
struct DailyBlock {
    time: Vec<String>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_probability_max: Vec<Option<i32>>,
    #[serde(default)]
    rain_sum: Vec<Option<f64>>,
    #[serde(default)]
    snowfall_sum: Vec<Option<f64>>,
    weather_code: Vec<Option<u8>>,
}

/// Primary weather provider: geocodes the city, then queries the forecast API.
pub struct OpenMeteoProvider {
    client: reqwest::Client,
    base_url: String,
    geocoder: GeocodingClient,
}

impl OpenMeteoProvider {
    pub fn new(client: reqwest::Client, base_url: &str, geocoder: GeocodingClient) -> Self {
        Self {
            client,
            base_url: trim_base(base_url),
            geocoder,
        }
    }

    async fn forecast(
        &self,
        city: &str,
        params: &[(&str, &str)],
    ) -> Result<(Place, ForecastResponse), ProviderError> {
        let place = self.geocoder.locate(city).await?;
        let request = self
            .client
            .get(format!("{}/v1/forecast", self.base_url))
            .query(&[
                ("latitude", place.latitude.to_string()),
                ("longitude", place.longitude.to_string()),
                ("timezone", "auto".to_owned()),
            ])
            .query(params);
        let response = fetch_json(PROVIDER, city, request).await?;
        Ok((place, response))
    }
}

#[async_trait::async_trait]
impl WeatherReader for OpenMeteoProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn current(&self, city: &str) -> Result<CurrentWeather, ProviderError> {
        let (_, response) = self.forecast(city, &[("current", CURRENT_FIELDS)]).await?;
        current_from(response).map_err(|e| ProviderError::unavailable(PROVIDER, e))
    }

    async fn daily(&self, city: &str) -> Result<DailyForecast, ProviderError> {
        let (place, response) = self
            .forecast(city, &[("daily", DAILY_FIELDS), ("forecast_days", "1")])
            .await?;
        daily_from(&place.name, response).map_err(|e| ProviderError::unavailable(PROVIDER, e))
    }

    async fn hourly(&self, city: &str) -> Result<HourlyForecast, ProviderError> {
        let (place, response) = self
            .forecast(city, &[("hourly", HOURLY_FIELDS), ("forecast_days", "2")])
            .await?;
        hourly_from(&place.name, response, Utc::now())
            .map_err(|e| ProviderError::unavailable(PROVIDER, e))
    }
}

pub(crate) fn current_from(response: ForecastResponse) -> anyhow::Result<CurrentWeather> {
    let current = response
        .current
        .ok_or_else(|| anyhow::anyhow!("response has no current block"))?;
    Ok(CurrentWeather {
        temperature: current.temperature_2m,
        humidity: current.relative_humidity_2m,
        description: wmo::describe(current.weather_code).0.to_owned(),
    })
}

pub(crate) fn daily_from(location: &str, response: ForecastResponse) -> anyhow::Result<DailyForecast> {
    let daily = response
        .daily
        .ok_or_else(|| anyhow::anyhow!("response has no daily block"))?;
    let date = daily
        .time
        .first()
        .ok_or_else(|| anyhow::anyhow!("daily block is empty"))?
        .clone();
    let max = value_at(&daily.temperature_2m_max, 0).ok_or_else(|| anyhow::anyhow!("missing max temperature"))?;
    let min = value_at(&daily.temperature_2m_min, 0).ok_or_else(|| anyhow::anyhow!("missing min temperature"))?;
    let code = value_at(&daily.weather_code, 0).unwrap_or_default();
    let chance = value_at(&daily.precipitation_probability_max, 0).unwrap_or_default();
    let rain = value_at(&daily.rain_sum, 0).unwrap_or_default();
    let snow = value_at(&daily.snowfall_sum, 0).unwrap_or_default();
    let (condition, icon) = wmo::describe(code);

    Ok(DailyForecast {
        location: location.to_owned(),
        date,
        max_temp_c: max,
        min_temp_c: min,
        avg_temp_c: round1((max + min) / 2.0),
        will_it_rain: rain > 0.0 || wmo::is_rain(code),
        chance_rain: chance,
        will_it_snow: snow > 0.0 || wmo::is_snow(code),
        chance_snow: if snow > 0.0 || wmo::is_snow(code) { chance } else { 0 },
        condition: condition.to_owned(),
        icon: icon.to_owned(),
    })
}

/// The first forecast hour strictly after `now`, in the location's local time.
pub(crate) fn hourly_from(
    location: &str,
    response: ForecastResponse,
    now: DateTime<Utc>,
) -> anyhow::Result<HourlyForecast> {
    let hourly = response
        .hourly
        .ok_or_else(|| anyhow::anyhow!("response has no hourly block"))?;
    let local_now = now.naive_utc() + Duration::seconds(response.utc_offset_seconds);

    let index = hourly
        .time
        .iter()
        .position(|t| {
            NaiveDateTime::parse_from_str(t, HOUR_FORMAT).is_ok_and(|hour| hour > local_now)
        })
        .ok_or_else(|| anyhow::anyhow!("no forecast hour after {local_now}"))?;

    let hour = NaiveDateTime::parse_from_str(&hourly.time[index], HOUR_FORMAT)?;
    let temp = value_at(&hourly.temperature_2m, index)
        .ok_or_else(|| anyhow::anyhow!("missing temperature for {hour}"))?;
    let code = value_at(&hourly.weather_code, index).unwrap_or_default();
    let chance = value_at(&hourly.precipitation_probability, index).unwrap_or_default();
    let rain = value_at(&hourly.rain, index).unwrap_or_default();
    let snow = value_at(&hourly.snowfall, index).unwrap_or_default();
    let (condition, icon) = wmo::describe(code);

    Ok(HourlyForecast {
        location: location.to_owned(),
        time: hour.format("%Y-%m-%d %H:%M").to_string(),
        temp_c: temp,
        will_it_rain: rain > 0.0 || wmo::is_rain(code),
        chance_rain: chance,
        will_it_snow: snow > 0.0 || wmo::is_snow(code),
        chance_snow: if snow > 0.0 || wmo::is_snow(code) { chance } else { 0 },
        condition: condition.to_owned(),
        icon: icon.to_owned(),
    })
}

fn value_at<T: Copy>(values: &[Option<T>], index: usize) -> Option<T> {
    values.get(index).copied().flatten()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
