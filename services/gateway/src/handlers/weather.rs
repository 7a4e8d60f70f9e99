use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use skycast_core::error::AppError;
use skycast_domain::weather::{CurrentWeather, DailyForecast, HourlyForecast};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CityQuery {
    #[serde(default)]
    pub city: String,
}

impl CityQuery {
    fn city(&self) -> Result<&str, AppError> {
        let city = self.city.trim();
        if city.is_empty() {
            return Err(AppError::InvalidInput("city is required".into()));
        }
        Ok(city)
    }
}

pub async fn get_current(
    State(state): State<AppState>,
    Query(query): Query<CityQuery>,
) -> Result<Json<CurrentWeather>, AppError> {
    Ok(Json(state.weather.current(query.city()?).await?))
}

pub async fn get_daily(
    State(state): State<AppState>,
    Query(query): Query<CityQuery>,
) -> Result<Json<DailyForecast>, AppError> {
    Ok(Json(state.weather.daily(query.city()?).await?))
}

pub async fn get_hourly(
    State(state): State<AppState>,
    Query(query): Query<CityQuery>,
) -> Result<Json<HourlyForecast>, AppError> {
    Ok(Json(state.weather.hourly(query.city()?).await?))
}

#[derive(Debug, Serialize)]
pub struct ValidateCityResponse {
    pub city: String,
}

pub async fn validate_city(
    State(state): State<AppState>,
    Query(query): Query<CityQuery>,
) -> Result<Json<ValidateCityResponse>, AppError> {
    let city = state.weather.validate_city(query.city()?).await?;
    Ok(Json(ValidateCityResponse { city }))
}
