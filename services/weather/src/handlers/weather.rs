use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};
use skycast_domain::weather::{CurrentWeather, DailyForecast, HourlyForecast};

use crate::error::WeatherServiceError;
use crate::state::AppState;
use crate::usecase::weather::{
    GetCurrentUseCase, GetDailyUseCase, GetHourlyUseCase, ValidateCityUseCase,
};

#[derive(Debug, Deserialize)]
pub struct CityQuery {
    #[serde(default)]
    pub city: String,
}

// ── GET /api/weather/current ─────────────────────────────────────────────────

pub async fn get_current(
    State(state): State<AppState>,
    Query(query): Query<CityQuery>,
) -> Result<Json<CurrentWeather>, WeatherServiceError> {
    let usecase = GetCurrentUseCase {
        reader: state.reader(),
    };
    Ok(Json(usecase.execute(&query.city).await?))
}

// ── GET /api/weather/daily ───────────────────────────────────────────────────

pub async fn get_daily(
    State(state): State<AppState>,
    Query(query): Query<CityQuery>,
) -> Result<Json<DailyForecast>, WeatherServiceError> {
    let usecase = GetDailyUseCase {
        reader: state.reader(),
    };
    Ok(Json(usecase.execute(&query.city).await?))
}

// ── GET /api/weather/hourly ──────────────────────────────────────────────────

pub async fn get_hourly(
    State(state): State<AppState>,
    Query(query): Query<CityQuery>,
) -> Result<Json<HourlyForecast>, WeatherServiceError> {
    let usecase = GetHourlyUseCase {
        reader: state.reader(),
    };
    Ok(Json(usecase.execute(&query.city).await?))
}

// ── GET /api/cities/validate ─────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ValidateCityResponse {
    pub city: String,
}

pub async fn validate_city(
    State(state): State<AppState>,
    Query(query): Query<CityQuery>,
) -> Result<Json<ValidateCityResponse>, WeatherServiceError> {
    let usecase = ValidateCityUseCase {
        validator: state.city_validator(),
    };
    let city = usecase.execute(&query.city).await?;
    Ok(Json(ValidateCityResponse { city }))
}
