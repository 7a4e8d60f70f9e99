//! Ordered fallback over interchangeable providers.
//!
//! A chain is built once at startup and never mutated. Every lookup walks
//! the nodes in order and returns the first success; when every node fails
//! the error of the last node is returned, so a chain whose tail is
//! unavailable reports unavailability even if an earlier node did not know
//! the city.

use std::sync::Arc;

use futures::future::BoxFuture;
use skycast_domain::weather::{CurrentWeather, DailyForecast, HourlyForecast};
use tracing::warn;

use crate::domain::provider::{CityValidator, ProviderError, WeatherReader};

const CHAIN: &str = "chain";

fn no_providers() -> ProviderError {
    ProviderError::unavailable(CHAIN, anyhow::anyhow!("no providers configured"))
}

// ── WeatherChain ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct WeatherChain {
    nodes: Vec<Arc<dyn WeatherReader>>,
}

impl WeatherChain {
    pub fn new(nodes: Vec<Arc<dyn WeatherReader>>) -> Self {
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    async fn first_success<'a, T, F>(
        &'a self,
        operation: &'static str,
        city: &'a str,
        call: F,
    ) -> Result<T, ProviderError>
    where
        F: Fn(&'a dyn WeatherReader, &'a str) -> BoxFuture<'a, Result<T, ProviderError>>,
    {
        let mut last = None;
        for node in &self.nodes {
            match call(node.as_ref(), city).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(provider = node.name(), operation, city, error = %e, "provider failed, trying next");
                    last = Some(e);
                }
            }
        }
        Err(last.unwrap_or_else(no_providers))
    }
}

#[async_trait::async_trait]
impl WeatherReader for WeatherChain {
    fn name(&self) -> &'static str {
        CHAIN
    }

    async fn current(&self, city: &str) -> Result<CurrentWeather, ProviderError> {
        self.first_success("current", city, |node, city| node.current(city))
            .await
    }

    async fn daily(&self, city: &str) -> Result<DailyForecast, ProviderError> {
        self.first_success("daily", city, |node, city| node.daily(city))
            .await
    }

    async fn hourly(&self, city: &str) -> Result<HourlyForecast, ProviderError> {
        self.first_success("hourly", city, |node, city| node.hourly(city))
            .await
    }
}

// ── ValidatorChain ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct ValidatorChain {
    nodes: Vec<Arc<dyn CityValidator>>,
}

impl ValidatorChain {
    pub fn new(nodes: Vec<Arc<dyn CityValidator>>) -> Self {
        Self { nodes }
    }
}

#[async_trait::async_trait]
impl CityValidator for ValidatorChain {
    fn name(&self) -> &'static str {
        CHAIN
    }

    async fn validate(&self, city: &str) -> Result<String, ProviderError> {
        let mut last = None;
        for node in &self.nodes {
            match node.validate(city).await {
                Ok(canonical) => return Ok(canonical),
                Err(e) => {
                    warn!(provider = node.name(), city, error = %e, "validator failed, trying next");
                    last = Some(e);
                }
            }
        }
        Err(last.unwrap_or_else(no_providers))
    }
}
