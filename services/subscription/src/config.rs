use std::time::Duration;

use skycast_core::config::{ConfigError, DatabaseConfig, Env, ServerConfig};

/// Schedules and limits of the background jobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobsConfig {
    /// Six-field cron (seconds first), evaluated in the host's local time zone.
    pub hourly_cron: String,
    pub daily_cron: String,
    pub relay_interval: Duration,
    pub relay_batch_size: u64,
    pub fanout_timeout: Duration,
}

impl JobsConfig {
    pub fn from_source(env: &Env) -> Result<Self, ConfigError> {
        Ok(Self {
            hourly_cron: env.string_or("HOURLY_CRON", "0 0 * * * *"),
            daily_cron: env.string_or("DAILY_CRON", "0 0 8 * * *"),
            relay_interval: Duration::from_millis(env.parse_or("RELAY_INTERVAL_MS", 1000)?),
            relay_batch_size: env.parse_or("RELAY_BATCH_SIZE", 10)?,
            fanout_timeout: Duration::from_secs(env.parse_or("FANOUT_TIMEOUT_SECS", 300)?),
        })
    }
}

/// Subscription service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct SubscriptionConfig {
    pub server: ServerConfig,
    pub grpc_port: u16,
    pub database: DatabaseConfig,
    pub rabbitmq_url: String,
    pub weather_grpc_url: String,
    /// Origin of the confirmation and unsubscribe links sent by email.
    pub public_base_url: String,
    pub jobs: JobsConfig,
}

impl SubscriptionConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(&Env::system())
    }

    pub fn from_source(env: &Env) -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig::from_source(env, 8081)?,
            grpc_port: env.parse_or("GRPC_PORT", 50052)?,
            database: DatabaseConfig::from_source(env)?,
            rabbitmq_url: env.required("RABBITMQ_URL")?,
            weather_grpc_url: env.required("WEATHER_GRPC_URL")?,
            public_base_url: env.required("PUBLIC_BASE_URL")?,
            jobs: JobsConfig::from_source(env)?,
        })
    }
}
