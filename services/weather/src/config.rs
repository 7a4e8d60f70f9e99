use skycast_core::config::{ConfigError, Env, ServerConfig};

/// Redis connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisConfig {
    pub addr: String,
    pub password: Option<String>,
    pub db: u32,
}

impl RedisConfig {
    pub fn from_source(env: &Env) -> Result<Self, ConfigError> {
        Ok(Self {
            addr: env.required("REDIS_ADDR")?,
            password: env.optional("REDIS_PASSWORD"),
            db: env.parse_or("REDIS_DB", 0)?,
        })
    }

    /// `redis://` URL understood by deadpool-redis.
    pub fn url(&self) -> String {
        let addr = self
            .addr
            .trim_start_matches("redis://")
            .trim_end_matches('/');
        match &self.password {
            Some(password) => format!("redis://:{password}@{addr}/{}", self.db),
            None => format!("redis://{addr}/{}", self.db),
        }
    }
}

/// Weather service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    pub server: ServerConfig,
    pub grpc_port: u16,
    pub redis: RedisConfig,
    pub open_meteo_url: String,
    pub geocoding_url: String,
    pub weather_api_url: String,
    pub weather_api_key: String,
    pub cache_prefix: String,
}

impl WeatherConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(&Env::system())
    }

    pub fn from_source(env: &Env) -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig::from_source(env, 8082)?,
            grpc_port: env.parse_or("GRPC_PORT", 50051)?,
            redis: RedisConfig::from_source(env)?,
            open_meteo_url: env.string_or("OPEN_METEO_URL", "https://api.open-meteo.com"),
            geocoding_url: env.string_or("GEOCODING_URL", "https://geocoding-api.open-meteo.com"),
            weather_api_url: env.string_or("WEATHER_API_URL", "https://api.weatherapi.com/v1"),
            weather_api_key: env.required("WEATHER_API_KEY")?,
            cache_prefix: env.string_or("CACHE_PREFIX", "weather"),
        })
    }
}
