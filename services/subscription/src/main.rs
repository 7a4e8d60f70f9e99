use std::sync::Arc;

use anyhow::Context;
use sea_orm::Database;
use tracing::info;

use skycast_core::shutdown::{SHUTDOWN_GRACE, shutdown_token};
use skycast_core::tracing::init_tracing;
use skycast_messaging::Publisher;
use skycast_messaging::amqp::AmqpConnection;
use skycast_messaging::relay::OutboxRelay;
use skycast_proto::subscription::subscription_service_server::SubscriptionServiceServer;

use skycast_subscription::config::SubscriptionConfig;
use skycast_subscription::events::writer_dispatcher;
use skycast_subscription::grpc_server::SubscriptionGrpcServer;
use skycast_subscription::infra::db::{DbOutboxStore, DbSubscriptionRepository, DbUnitOfWork};
use skycast_subscription::infra::grpc::GrpcCityValidator;
use skycast_subscription::jobs::fanout::FanoutExecutor;
use skycast_subscription::jobs::scheduler::BackgroundJobs;
use skycast_subscription::links::LinkBuilder;
use skycast_subscription::router::build_router;
use skycast_subscription::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = SubscriptionConfig::from_env().context("invalid configuration")?;
    let shutdown = shutdown_token();

    let db = Database::connect(&config.database.url)
        .await
        .context("failed to connect to database")?;

    let bus = AmqpConnection::connect(&config.rabbitmq_url)
        .await
        .context("failed to connect to rabbitmq")?;
    // Separate channels for the direct publisher and the relay.
    let publisher: Arc<dyn Publisher> = Arc::new(
        bus.publisher()
            .await
            .context("failed to open publisher channel")?,
    );
    let relay_publisher: Arc<dyn Publisher> = Arc::new(
        bus.publisher()
            .await
            .context("failed to open relay channel")?,
    );

    let validator = GrpcCityValidator::lazy(&config.weather_grpc_url)?;
    let links = LinkBuilder::new(&config.public_base_url);
    let dispatcher = Arc::new(writer_dispatcher(links, publisher));

    let state = AppState {
        uow: DbUnitOfWork { db: db.clone() },
        validator,
        dispatcher: Arc::clone(&dispatcher),
    };

    // Background jobs
    let subscriptions = Arc::new(DbSubscriptionRepository { db: db.clone() });
    let fanout = FanoutExecutor::new(subscriptions.clone(), dispatcher, subscriptions)
        .with_timeout(config.jobs.fanout_timeout);
    let relay = OutboxRelay::new(Arc::new(DbOutboxStore { db }), relay_publisher)
        .with_batch_size(config.jobs.relay_batch_size)
        .with_interval(config.jobs.relay_interval);
    let jobs = BackgroundJobs::start(&config.jobs, Arc::new(fanout), relay, shutdown.child_token())
        .await
        .context("failed to start background jobs")?;

    // Spawn gRPC server
    let grpc_addr = config
        .server
        .addr_for(config.grpc_port)
        .parse()
        .context("invalid gRPC address")?;
    let grpc_server = SubscriptionGrpcServer {
        state: state.clone(),
    };
    let grpc_shutdown = shutdown.clone();
    let grpc = tokio::spawn(async move {
        info!("subscription gRPC server listening on {grpc_addr}");
        tonic::transport::Server::builder()
            .add_service(SubscriptionServiceServer::new(grpc_server))
            .serve_with_shutdown(grpc_addr, grpc_shutdown.cancelled_owned())
            .await
    });

    // HTTP server
    let router = build_router(state);
    let http_addr = config.server.http_addr();
    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("failed to bind {http_addr}"))?;

    info!("subscription service listening on {http_addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await
        .context("http server error")?;

    let drain = async {
        if let Err(e) = jobs.shutdown().await {
            tracing::error!(error = ?e, "background jobs did not stop cleanly");
        }
        match grpc.await {
            Ok(result) => result.context("gRPC server error"),
            Err(e) => {
                tracing::error!(error = %e, "gRPC server task panicked");
                Ok(())
            }
        }
    };
    match tokio::time::timeout(SHUTDOWN_GRACE, drain).await {
        Ok(result) => result?,
        Err(_) => tracing::warn!("shutdown did not finish within the grace period"),
    }
    if let Err(e) = bus.close().await {
        tracing::warn!(error = %e, "failed to close rabbitmq connection");
    }
    info!("subscription service stopped");
    Ok(())
}
