use axum::http::StatusCode;
use serde_json::Value;

use crate::helpers::{Harness, UNKNOWN_CITY};

#[tokio::test]
async fn should_return_current_weather() {
    let h = Harness::new();

    let resp = h.server.get("/api/weather/current?city=Kyiv").await;

    assert_eq!(resp.status_code(), StatusCode::OK);
    let json: Value = resp.json();
    assert_eq!(json["temperature"], 18.5);
    assert_eq!(json["humidity"], 62.0);
    assert_eq!(json["description"], "Partly cloudy");
}

#[tokio::test]
async fn should_return_forecasts_in_camel_case() {
    let h = Harness::new();

    let daily: Value = h.server.get("/api/weather/daily?city=Kyiv").await.json();
    assert_eq!(daily["location"], "Kyiv");
    assert_eq!(daily["maxTempC"], 24.0);
    assert_eq!(daily["chanceRain"], 80);

    let hourly: Value = h.server.get("/api/weather/hourly?city=Lviv").await.json();
    assert_eq!(hourly["time"], "2025-06-01 14:00");
    assert_eq!(hourly["tempC"], 21.0);
}

#[tokio::test]
async fn should_reject_missing_city() {
    let h = Harness::new();

    for path in ["/api/weather/current", "/api/weather/daily?city=", "/api/cities/validate?city=%20"] {
        let resp = h.server.get(path).await;
        assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST, "{path}");
        let json: Value = resp.json();
        assert_eq!(json["description"], "city is required");
    }
}

#[tokio::test]
async fn should_return_404_for_unknown_city() {
    let h = Harness::new();

    let resp = h
        .server
        .get(&format!("/api/weather/hourly?city={UNKNOWN_CITY}"))
        .await;

    assert_eq!(resp.status_code(), StatusCode::NOT_FOUND);
    let json: Value = resp.json();
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn should_return_503_when_upstream_is_down() {
    let h = Harness::new();
    h.weather.set_unavailable(true);

    let resp = h.server.get("/api/weather/current?city=Kyiv").await;

    assert_eq!(resp.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    let json: Value = resp.json();
    assert_eq!(json["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn should_return_canonical_city() {
    let h = Harness::new();

    let resp = h.server.get("/api/cities/validate?city=kyiv").await;

    assert_eq!(resp.status_code(), StatusCode::OK);
    let json: Value = resp.json();
    assert_eq!(json["city"], "Kyiv");
}
