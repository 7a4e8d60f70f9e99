use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use axum_test::TestServer;
use prometheus::Registry;
use serde_json::Value;

use skycast_core::config::Env;
use skycast_testing::fixture::Fixture;
use skycast_testing::upstream::MockUpstream;
use skycast_weather::config::WeatherConfig;
use skycast_weather::domain::provider::{CityValidator, WeatherReader};
use skycast_weather::infra::http::build_client;
use skycast_weather::infra::metrics::PrometheusCacheMetrics;
use skycast_weather::router::build_router;
use skycast_weather::state::AppState;

use crate::helpers::{Behaviour, InMemoryCache, StubReader, StubValidator};

fn stub_server(reader: Behaviour, validator: Behaviour) -> TestServer {
    let weather: Arc<dyn WeatherReader> = StubReader::new("stub", reader);
    let validator: Arc<dyn CityValidator> = StubValidator::new("stub", validator);
    let state = AppState {
        weather,
        validator,
        registry: Registry::new(),
    };
    TestServer::new(build_router(state)).unwrap()
}

// ── Routes ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_return_current_weather() {
    let server = stub_server(Behaviour::Succeed, Behaviour::Succeed);

    let resp = server
        .get("/api/weather/current")
        .add_query_param("city", "London")
        .await;

    assert_eq!(resp.status_code(), StatusCode::OK);
    let json: Value = resp.json();
    assert_eq!(json["temperature"], 20.5);
    assert_eq!(json["humidity"], 70.0);
    assert_eq!(json["description"], "Partly Cloudy");
}

#[tokio::test]
async fn should_return_camel_case_forecasts() {
    let server = stub_server(Behaviour::Succeed, Behaviour::Succeed);

    let daily: Value = server
        .get("/api/weather/daily")
        .add_query_param("city", "London")
        .await
        .json();
    assert_eq!(daily["maxTempC"], 17.9);
    assert_eq!(daily["willItRain"], true);

    let hourly: Value = server
        .get("/api/weather/hourly")
        .add_query_param("city", "London")
        .await
        .json();
    assert_eq!(hourly["time"], "2026-10-19 15:00");
    assert_eq!(hourly["chanceRain"], 75);
}

#[tokio::test]
async fn should_reject_missing_city_with_envelope() {
    let server = stub_server(Behaviour::Succeed, Behaviour::Succeed);

    let resp = server.get("/api/weather/daily").await;

    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
    let json: Value = resp.json();
    assert_eq!(json["code"], "INVALID_INPUT");
    assert_eq!(json["description"], "city is required");
    assert_eq!(json["path"], "/api/weather/daily");
    assert_eq!(json["method"], "GET");
    assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn should_map_unknown_city_to_not_found() {
    let server = stub_server(Behaviour::NotFound, Behaviour::NotFound);

    let resp = server
        .get("/api/weather/hourly")
        .add_query_param("city", "Atlantis")
        .await;
    assert_eq!(resp.status_code(), StatusCode::NOT_FOUND);

    let resp = server
        .get("/api/cities/validate")
        .add_query_param("city", "Atlantis")
        .await;
    assert_eq!(resp.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn should_map_unavailable_upstream_to_503() {
    let server = stub_server(Behaviour::Unavailable, Behaviour::Succeed);

    let resp = server
        .get("/api/weather/current")
        .add_query_param("city", "London")
        .await;

    assert_eq!(resp.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    let json: Value = resp.json();
    assert_eq!(json["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn should_return_canonical_city() {
    let server = stub_server(Behaviour::Succeed, Behaviour::Succeed);

    let resp = server
        .get("/api/cities/validate")
        .add_query_param("city", "lONDON")
        .await;

    assert_eq!(resp.status_code(), StatusCode::OK);
    let json: Value = resp.json();
    assert_eq!(json["city"], "London");
}

#[tokio::test]
async fn should_answer_healthz() {
    let server = stub_server(Behaviour::Succeed, Behaviour::Succeed);
    let resp = server.get("/healthz").await;
    assert_eq!(resp.status_code(), StatusCode::OK);
}

// ── Assembled chains against recorded upstreams ──────────────────────────────

fn fixture(path: &'static str) -> impl Fn() -> std::future::Ready<Json<Value>> + Clone {
    move || std::future::ready(Json(Fixture::load(path)))
}

async fn upstream(forecast_ok: bool) -> MockUpstream {
    let mut router = Router::new()
        .route(
            "/v1/search",
            get(fixture("contracts/providers/open_meteo/geocoding_london.json")),
        )
        .route(
            "/wa/current.json",
            get(fixture("contracts/providers/weatherapi/current_london.json")),
        )
        .route(
            "/wa/search.json",
            get(fixture("contracts/providers/weatherapi/search_london.json")),
        );
    router = if forecast_ok {
        router.route(
            "/v1/forecast",
            get(fixture("contracts/providers/open_meteo/forecast_current.json")),
        )
    } else {
        router.route("/v1/forecast", get(|| async { StatusCode::BAD_GATEWAY }))
    };
    MockUpstream::serve(router).await
}

fn assembled(upstream: &MockUpstream) -> (TestServer, PrometheusCacheMetrics) {
    let base = upstream.base_url().to_owned();
    let env = Env::from_pairs([
        ("REDIS_ADDR", "localhost:6379".to_owned()),
        ("WEATHER_API_KEY", "test-key".to_owned()),
        ("OPEN_METEO_URL", base.clone()),
        ("GEOCODING_URL", base.clone()),
        ("WEATHER_API_URL", format!("{base}/wa")),
    ]);
    let config = WeatherConfig::from_source(&env).unwrap();
    let registry = Registry::new();
    let metrics = PrometheusCacheMetrics::register(&registry).unwrap();
    let state = AppState::assemble(
        &config,
        build_client().unwrap(),
        Arc::new(InMemoryCache::new()),
        Arc::new(metrics.clone()),
        registry,
    );
    (TestServer::new(build_router(state)).unwrap(), metrics)
}

#[tokio::test]
async fn should_serve_primary_provider_and_cache_it() {
    let upstream = upstream(true).await;
    let (server, metrics) = assembled(&upstream);

    for _ in 0..2 {
        let json: Value = server
            .get("/api/weather/current")
            .add_query_param("city", "London")
            .await
            .json();
        assert_eq!(json["temperature"], 20.5);
        assert_eq!(json["description"], "Partly cloudy");
    }

    // geocoding + forecast, once
    assert_eq!(upstream.hits(), 2);
    assert_eq!(metrics.hits("weather"), 1);
    assert_eq!(metrics.misses("weather"), 1);

    let text = server.get("/metrics").await.text();
    assert!(text.contains("weather_cache_hits_total{cache=\"weather\"} 1"));
}

#[tokio::test]
async fn should_fall_back_to_weatherapi_when_open_meteo_fails() {
    let upstream = upstream(false).await;
    let (server, _) = assembled(&upstream);

    let resp = server
        .get("/api/weather/current")
        .add_query_param("city", "London")
        .await;

    assert_eq!(resp.status_code(), StatusCode::OK);
    let json: Value = resp.json();
    assert_eq!(json["temperature"], 20.5);
    assert_eq!(json["humidity"], 70.0);
    assert_eq!(json["description"], "Partly Cloudy");
}

#[tokio::test]
async fn should_validate_with_geocoding() {
    let upstream = upstream(true).await;
    let (server, _) = assembled(&upstream);

    let json: Value = server
        .get("/api/cities/validate")
        .add_query_param("city", "london")
        .await
        .json();
    assert_eq!(json["city"], "London");
}
