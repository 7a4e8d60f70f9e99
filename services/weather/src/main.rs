use std::sync::Arc;

use anyhow::Context;
use prometheus::Registry;
use tracing::info;

use skycast_core::shutdown::{SHUTDOWN_GRACE, shutdown_token};
use skycast_core::tracing::init_tracing;
use skycast_proto::weather::weather_service_server::WeatherServiceServer;

use skycast_weather::config::WeatherConfig;
use skycast_weather::grpc_server::WeatherGrpcServer;
use skycast_weather::infra::cache::RedisCache;
use skycast_weather::infra::http::build_client;
use skycast_weather::infra::metrics::PrometheusCacheMetrics;
use skycast_weather::router::build_router;
use skycast_weather::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = WeatherConfig::from_env().context("invalid configuration")?;
    let shutdown = shutdown_token();

    let cache = RedisCache::connect(&config.redis.url()).context("failed to create redis pool")?;
    let registry = Registry::new();
    let metrics = PrometheusCacheMetrics::register(&registry)
        .context("failed to register cache metrics")?;
    let client = build_client().context("failed to build http client")?;

    let state = AppState::assemble(
        &config,
        client,
        Arc::new(cache),
        Arc::new(metrics),
        registry,
    );

    // Spawn gRPC server
    let grpc_addr = config
        .server
        .addr_for(config.grpc_port)
        .parse()
        .context("invalid gRPC address")?;
    let grpc_server = WeatherGrpcServer {
        state: state.clone(),
    };
    let grpc_shutdown = shutdown.clone();
    let grpc = tokio::spawn(async move {
        info!("weather gRPC server listening on {grpc_addr}");
        tonic::transport::Server::builder()
            .add_service(WeatherServiceServer::new(grpc_server))
            .serve_with_shutdown(grpc_addr, grpc_shutdown.cancelled_owned())
            .await
    });

    // HTTP server
    let router = build_router(state);
    let http_addr = config.server.http_addr();
    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("failed to bind {http_addr}"))?;

    info!("weather service listening on {http_addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await
        .context("http server error")?;

    match tokio::time::timeout(SHUTDOWN_GRACE, grpc).await {
        Ok(Ok(result)) => result.context("gRPC server error")?,
        Ok(Err(e)) => tracing::error!(error = %e, "gRPC server task panicked"),
        Err(_) => tracing::warn!("gRPC server did not stop within the grace period"),
    }
    info!("weather service stopped");
    Ok(())
}
