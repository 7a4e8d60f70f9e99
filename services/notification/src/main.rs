use std::sync::Arc;

use anyhow::Context;
use sea_orm::Database;
use tracing::info;

use skycast_core::shutdown::{SHUTDOWN_GRACE, shutdown_token};
use skycast_core::tracing::init_tracing;
use skycast_domain::event::EventName;
use skycast_messaging::amqp::AmqpConnection;
use skycast_messaging::consumer::{Consumer, ConsumerGroup, IdempotentConsumer};

use skycast_notification::config::NotificationConfig;
use skycast_notification::domain::ports::Mailer;
use skycast_notification::infra::db::DbIdempotenceStore;
use skycast_notification::infra::grpc::GrpcWeatherPort;
use skycast_notification::infra::smtp::SmtpMailer;
use skycast_notification::router::build_router;
use skycast_notification::usecase::notify::{ConfirmationEmailHandler, WeatherUpdateHandler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = NotificationConfig::from_env().context("invalid configuration")?;
    let shutdown = shutdown_token();

    let db = Database::connect(&config.database.url)
        .await
        .context("failed to connect to database")?;

    let mailer: Arc<dyn Mailer> =
        Arc::new(SmtpMailer::new(&config.smtp).context("invalid SMTP configuration")?);
    let weather = Arc::new(GrpcWeatherPort::lazy(&config.weather_grpc_url)?);

    let bus = AmqpConnection::connect(&config.rabbitmq_url)
        .await
        .context("failed to connect to rabbitmq")?;

    // Consumers, one channel each
    let mut consumers = ConsumerGroup::new();
    let confirmations = IdempotentConsumer::new(
        EventName::UserSubscribed.queue(),
        Arc::new(
            bus.subscriber()
                .await
                .context("failed to open user_subscribed channel")?,
        ),
        Arc::new(ConfirmationEmailHandler::new(mailer.clone())),
        Arc::new(DbIdempotenceStore { db }),
    );
    consumers.spawn(confirmations.run(shutdown.child_token()));

    let updates = Consumer::new(
        EventName::WeatherUpdated.queue(),
        Arc::new(
            bus.subscriber()
                .await
                .context("failed to open weather_updated channel")?,
        ),
        Arc::new(WeatherUpdateHandler::new(weather, mailer)),
    );
    consumers.spawn(updates.run(shutdown.child_token()));

    // HTTP server
    let http_addr = config.server.http_addr();
    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("failed to bind {http_addr}"))?;

    info!("notification service listening on {http_addr}");
    axum::serve(listener, build_router())
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await
        .context("http server error")?;

    consumers.shutdown(SHUTDOWN_GRACE).await;
    if let Err(e) = bus.close().await {
        tracing::warn!(error = %e, "failed to close rabbitmq connection");
    }
    info!("notification service stopped");
    Ok(())
}

