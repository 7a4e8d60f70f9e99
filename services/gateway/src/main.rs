use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use skycast_core::shutdown::shutdown_token;
use skycast_core::tracing::init_tracing;

use skycast_gateway::config::GatewayConfig;
use skycast_gateway::infra::grpc::{GrpcSubscriptionBackend, GrpcWeatherBackend};
use skycast_gateway::router::build_router;
use skycast_gateway::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = GatewayConfig::from_env().context("invalid configuration")?;
    let shutdown = shutdown_token();

    let state = AppState {
        subscriptions: Arc::new(GrpcSubscriptionBackend::lazy(&config.subscription_grpc_url)?),
        weather: Arc::new(GrpcWeatherBackend::lazy(&config.weather_grpc_url)?),
    };

    let router = build_router(state);
    let http_addr = config.server.http_addr();
    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("failed to bind {http_addr}"))?;

    info!("gateway listening on {http_addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .context("http server error")?;

    info!("gateway stopped");
    Ok(())
}
