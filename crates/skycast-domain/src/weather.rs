//! Weather payloads served by the weather service and embedded in emails.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Granularity of a forecast; selects the cache key segment and TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastType {
    Current,
    Hourly,
    Daily,
}

impl ForecastType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
        }
    }
}

impl fmt::Display for ForecastType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ForecastType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "current" => Ok(Self::Current),
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            other => Err(format!("unknown forecast type {other:?}")),
        }
    }
}

/// Conditions right now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub temperature: f64,
    pub humidity: f64,
    pub description: String,
}

/// Aggregate forecast for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecast {
    pub location: String,
    /// `YYYY-MM-DD` in the location's local time.
    pub date: String,
    pub max_temp_c: f64,
    pub min_temp_c: f64,
    pub avg_temp_c: f64,
    pub will_it_rain: bool,
    pub chance_rain: i32,
    pub will_it_snow: bool,
    pub chance_snow: i32,
    pub condition: String,
    pub icon: String,
}

/// Forecast for one hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyForecast {
    pub location: String,
    /// `YYYY-MM-DD HH:MM` in the location's local time.
    pub time: String,
    pub temp_c: f64,
    pub will_it_rain: bool,
    pub chance_rain: i32,
    pub will_it_snow: bool,
    pub chance_snow: i32,
    pub condition: String,
    pub icon: String,
}

/// Forecast for a fan-out email: daily subscribers get the day, hourly the next hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Forecast {
    Daily(DailyForecast),
    Hourly(HourlyForecast),
}
