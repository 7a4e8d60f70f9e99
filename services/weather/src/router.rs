use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use skycast_core::health::healthz;
use skycast_core::metrics::metrics_router;
use skycast_core::middleware::{error_envelope, request_id_layer};

use crate::handlers::weather::{get_current, get_daily, get_hourly, validate_city};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let registry = state.registry.clone();
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        // Weather
        .route("/api/weather/current", get(get_current))
        .route("/api/weather/daily", get(get_daily))
        .route("/api/weather/hourly", get(get_hourly))
        // Cities
        .route("/api/cities/validate", get(validate_city))
        .with_state(state)
        .merge(metrics_router(registry))
        .layer(axum::middleware::from_fn(error_envelope))
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
}
