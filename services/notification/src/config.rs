use skycast_core::config::{ConfigError, DatabaseConfig, Env, ServerConfig};

/// Outgoing mail relay. The relay is reached over STARTTLS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Sender address, e.g. `Skycast <noreply@skycast.example>`.
    pub from: String,
}

impl SmtpConfig {
    pub fn from_source(env: &Env) -> Result<Self, ConfigError> {
        Ok(Self {
            host: env.required("SMTP_HOST")?,
            port: env.parse_or("SMTP_PORT", 587)?,
            user: env.required("SMTP_USER")?,
            password: env.required("SMTP_PASSWORD")?,
            from: env.required("SMTP_FROM")?,
        })
    }
}

/// Notification service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub rabbitmq_url: String,
    pub weather_grpc_url: String,
    pub smtp: SmtpConfig,
}

impl NotificationConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(&Env::system())
    }

    pub fn from_source(env: &Env) -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig::from_source(env, 8083)?,
            database: DatabaseConfig::from_source(env)?,
            rabbitmq_url: env.required("RABBITMQ_URL")?,
            weather_grpc_url: env.required("WEATHER_GRPC_URL")?,
            smtp: SmtpConfig::from_source(env)?,
        })
    }
}
