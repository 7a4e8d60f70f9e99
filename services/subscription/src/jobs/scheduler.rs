use std::sync::Arc;

use anyhow::Context as _;
use chrono::{Local, TimeZone};
use skycast_domain::subscription::Frequency;
use skycast_messaging::relay::OutboxRelay;
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::JobsConfig;
use crate::domain::repository::ConfirmedSubscriptions;
use crate::jobs::fanout::{FanoutError, FanoutExecutor};

/// Running cron jobs plus the relay loop.
pub struct BackgroundJobs {
    scheduler: JobScheduler,
    relay: JoinHandle<()>,
}

impl BackgroundJobs {
    /// Register the hourly and daily fan-out jobs, start the scheduler and
    /// spawn the outbox relay. Everything stops once `cancel` trips.
    pub async fn start<S: ConfirmedSubscriptions>(
        config: &JobsConfig,
        fanout: Arc<FanoutExecutor<S>>,
        relay: OutboxRelay,
        cancel: CancellationToken,
    ) -> anyhow::Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .context("create job scheduler")?;

        for (frequency, cron) in [
            (Frequency::Hourly, config.hourly_cron.as_str()),
            (Frequency::Daily, config.daily_cron.as_str()),
        ] {
            let job = fanout_job(cron, Local, frequency, fanout.clone(), cancel.clone())?;
            scheduler
                .add(job)
                .await
                .with_context(|| format!("add {frequency} fan-out job"))?;
            info!(%frequency, cron, "fan-out job registered");
        }
        scheduler.start().await.context("start job scheduler")?;

        let relay = tokio::spawn(async move { relay.run(cancel).await });
        Ok(Self { scheduler, relay })
    }

    /// Stop scheduling new runs and wait for the relay loop to exit.
    pub async fn shutdown(mut self) -> anyhow::Result<()> {
        self.scheduler
            .shutdown()
            .await
            .context("shut down job scheduler")?;
        self.relay.await.context("join outbox relay")?;
        info!("background jobs stopped");
        Ok(())
    }
}

/// Cron fields are read as wall-clock time in `timezone`.
fn fanout_job<S, Tz>(
    cron: &str,
    timezone: Tz,
    frequency: Frequency,
    fanout: Arc<FanoutExecutor<S>>,
    cancel: CancellationToken,
) -> anyhow::Result<CronJob>
where
    S: ConfirmedSubscriptions,
    Tz: TimeZone + Send + Sync + 'static,
    Tz::Offset: Send + Sync,
{
    CronJob::new_async_tz(cron, timezone, move |_uuid, _lock| {
        let fanout = fanout.clone();
        let cancel = cancel.clone();
        Box::pin(async move {
            if cancel.is_cancelled() {
                return;
            }
            match fanout.run(frequency, &cancel).await {
                Ok(report) => {
                    info!(%frequency, dispatched = report.dispatched, "fan-out run complete")
                }
                Err(FanoutError::Cancelled) => info!(%frequency, "fan-out run cancelled"),
                Err(e) => error!(%frequency, error = ?e, "fan-out run failed"),
            }
        })
    })
    .with_context(|| format!("invalid {frequency} cron expression {cron:?}"))
}
