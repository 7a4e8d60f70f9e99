use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use skycast_core::health::healthz;
use skycast_core::middleware::{error_envelope, request_id_layer};

use crate::handlers::subscription::{confirm, missing_token, subscribe, unsubscribe};
use crate::handlers::weather::{get_current, get_daily, get_hourly, validate_city};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        // Subscriptions
        .route("/api/subscribe", post(subscribe))
        .route("/api/confirm/", get(missing_token))
        .route("/api/confirm/{token}", get(confirm))
        .route("/api/unsubscribe/", get(missing_token))
        .route("/api/unsubscribe/{token}", get(unsubscribe))
        // Weather
        .route("/api/weather/current", get(get_current))
        .route("/api/weather/daily", get(get_daily))
        .route("/api/weather/hourly", get(get_hourly))
        .route("/api/cities/validate", get(validate_city))
        .with_state(state)
        .layer(axum::middleware::from_fn(error_envelope))
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
}
