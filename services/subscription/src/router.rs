use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use skycast_core::health::healthz;
use skycast_core::middleware::{error_envelope, request_id_layer};

use crate::domain::repository::{CityValidatorPort, UnitOfWork};
use crate::handlers::subscription::{confirm, subscribe, unsubscribe};
use crate::state::AppState;

pub fn build_router<U, V>(state: AppState<U, V>) -> Router
where
    U: UnitOfWork + Clone + 'static,
    V: CityValidatorPort + Clone + 'static,
{
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        // Subscriptions
        .route("/api/subscribe", post(subscribe::<U, V>))
        .route("/api/confirm/{token}", get(confirm::<U, V>))
        .route("/api/unsubscribe/{token}", get(unsubscribe::<U, V>))
        .with_state(state)
        .layer(axum::middleware::from_fn(error_envelope))
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
}
