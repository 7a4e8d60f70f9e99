use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use skycast_core::health::healthz;
use skycast_core::middleware::{error_envelope, request_id_layer};

/// The notification service only consumes queues; HTTP is for probes.
pub fn build_router() -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .layer(axum::middleware::from_fn(error_envelope))
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
}
