//! Environment-driven configuration helpers.
//!
//! Every service builds its config struct from an [`Env`]: the process
//! environment in production (after loading an optional `.env`), or a fixed
//! set of pairs in tests.

use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    Missing(String),
    #[error("invalid value for env var {name}: {value:?}")]
    Invalid { name: String, value: String },
}

/// Source of configuration variables.
#[derive(Debug, Clone, Default)]
pub struct Env {
    overrides: Option<HashMap<String, String>>,
}

impl Env {
    /// Read from the process environment, loading `.env` first when present.
    pub fn system() -> Self {
        let _ = dotenvy::dotenv();
        Self { overrides: None }
    }

    /// Fixed variables, used by tests instead of mutating the process env.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            overrides: Some(
                pairs
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Value of `name`, treating an empty string as unset.
    pub fn optional(&self, name: &str) -> Option<String> {
        let value = match &self.overrides {
            Some(map) => map.get(name).cloned(),
            None => std::env::var(name).ok(),
        };
        value.filter(|v| !v.trim().is_empty())
    }

    pub fn required(&self, name: &str) -> Result<String, ConfigError> {
        self.optional(name)
            .ok_or_else(|| ConfigError::Missing(name.to_owned()))
    }

    pub fn parse_or<T: FromStr>(&self, name: &str, default: T) -> Result<T, ConfigError> {
        match self.optional(name) {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                name: name.to_owned(),
                value,
            }),
            None => Ok(default),
        }
    }

    pub fn string_or(&self, name: &str, default: &str) -> String {
        self.optional(name).unwrap_or_else(|| default.to_owned())
    }
}

/// PostgreSQL connection settings: either `DATABASE_URL` or its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
}

impl DatabaseConfig {
    pub fn from_source(env: &Env) -> Result<Self, ConfigError> {
        if let Some(url) = env.optional("DATABASE_URL") {
            return Ok(Self { url });
        }
        let host = env.required("DB_HOST")?;
        let port: u16 = env.parse_or("DB_PORT", 5432)?;
        let user = env.required("DB_USER")?;
        let password = env.required("DB_PASSWORD")?;
        let name = env.required("DB_NAME")?;
        let sslmode = env.string_or("DB_SSLMODE", "disable");
        Ok(Self {
            url: format!("postgres://{user}:{password}@{host}:{port}/{name}?sslmode={sslmode}"),
        })
    }
}

/// Listen address settings shared by every service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub http_port: u16,
}

impl ServerConfig {
    pub fn from_source(env: &Env, default_http_port: u16) -> Result<Self, ConfigError> {
        Ok(Self {
            host: env.string_or("SERVER_HOST", "0.0.0.0"),
            http_port: env.parse_or("HTTP_PORT", default_http_port)?,
        })
    }

    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }

    pub fn addr_for(&self, port: u16) -> String {
        format!("{}:{}", self.host, port)
    }
}
