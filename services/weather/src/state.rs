use std::sync::Arc;

use prometheus::Registry;

use crate::config::WeatherConfig;
use crate::domain::cache::{Cache, CacheMetrics};
use crate::domain::provider::{CityValidator, WeatherReader};
use crate::infra::open_meteo::{GeocodingClient, GeocodingValidator, OpenMeteoProvider};
use crate::infra::weatherapi::{WeatherApiClient, WeatherApiProvider, WeatherApiValidator};
use crate::usecase::cached::{CachedCityValidator, CachedWeatherReader};
use crate::usecase::chain::{ValidatorChain, WeatherChain};

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub weather: Arc<dyn WeatherReader>,
    pub validator: Arc<dyn CityValidator>,
    pub registry: Registry,
}

impl AppState {
    /// Wire both provider chains: Open-Meteo first, WeatherAPI as fallback,
    /// every leaf behind its own cache proxy.
    pub fn assemble(
        config: &WeatherConfig,
        client: reqwest::Client,
        cache: Arc<dyn Cache>,
        metrics: Arc<dyn CacheMetrics>,
        registry: Registry,
    ) -> Self {
        let geocoder = GeocodingClient::new(client.clone(), &config.geocoding_url);
        let weather_api =
            WeatherApiClient::new(client.clone(), &config.weather_api_url, &config.weather_api_key);

        let readers: Vec<Arc<dyn WeatherReader>> = vec![
            Arc::new(OpenMeteoProvider::new(
                client,
                &config.open_meteo_url,
                geocoder.clone(),
            )),
            Arc::new(WeatherApiProvider::new(weather_api.clone())),
        ];
        let validators: Vec<Arc<dyn CityValidator>> = vec![
            Arc::new(GeocodingValidator::new(geocoder)),
            Arc::new(WeatherApiValidator::new(weather_api)),
        ];

        let readers = readers
            .into_iter()
            .map(|leaf| {
                let prefix = format!("{}:{}", config.cache_prefix, leaf.name());
                Arc::new(CachedWeatherReader::new(
                    leaf,
                    Arc::clone(&cache),
                    Arc::clone(&metrics),
                    prefix,
                )) as Arc<dyn WeatherReader>
            })
            .collect();
        let validator_prefix = format!("{}:validator", config.cache_prefix);
        let validators = validators
            .into_iter()
            .map(|leaf| {
                Arc::new(CachedCityValidator::new(
                    leaf,
                    Arc::clone(&cache),
                    Arc::clone(&metrics),
                    validator_prefix.clone(),
                )) as Arc<dyn CityValidator>
            })
            .collect();

        Self {
            weather: Arc::new(WeatherChain::new(readers)),
            validator: Arc::new(ValidatorChain::new(validators)),
            registry,
        }
    }

    pub fn reader(&self) -> Arc<dyn WeatherReader> {
        Arc::clone(&self.weather)
    }

    pub fn city_validator(&self) -> Arc<dyn CityValidator> {
        Arc::clone(&self.validator)
    }
}
