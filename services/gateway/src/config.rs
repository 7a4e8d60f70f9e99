use skycast_core::config::{ConfigError, Env, ServerConfig};

/// Gateway configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    pub subscription_grpc_url: String,
    pub weather_grpc_url: String,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(&Env::system())
    }

    pub fn from_source(env: &Env) -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig::from_source(env, 8080)?,
            subscription_grpc_url: env.required("SUBSCRIPTION_GRPC_URL")?,
            weather_grpc_url: env.required("WEATHER_GRPC_URL")?,
        })
    }
}
