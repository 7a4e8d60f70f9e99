use std::sync::Arc;

use skycast_domain::weather::CurrentWeather;
use skycast_weather::domain::provider::{CityValidator, ProviderError, WeatherReader};
use skycast_weather::usecase::chain::{ValidatorChain, WeatherChain};

use crate::helpers::{Behaviour, StubReader, StubValidator, london_current};

fn readers(nodes: &[&Arc<StubReader>]) -> Vec<Arc<dyn WeatherReader>> {
    nodes
        .iter()
        .map(|n| Arc::clone(n) as Arc<dyn WeatherReader>)
        .collect()
}

fn validators(nodes: &[&Arc<StubValidator>]) -> Vec<Arc<dyn CityValidator>> {
    nodes
        .iter()
        .map(|n| Arc::clone(n) as Arc<dyn CityValidator>)
        .collect()
}

// ── WeatherChain ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_fall_back_to_secondary_when_primary_fails() {
    let primary = StubReader::with_current(
        "primary",
        Behaviour::Unavailable,
        CurrentWeather {
            temperature: -1.0,
            humidity: 0.0,
            description: "unused".into(),
        },
    );
    let secondary = StubReader::new("secondary", Behaviour::Succeed);
    let chain = WeatherChain::new(readers(&[&primary, &secondary]));

    let current = chain.current("London").await.unwrap();

    assert_eq!(current, london_current());
    assert_eq!(primary.calls(), 1);
    assert_eq!(secondary.calls(), 1);
}

#[tokio::test]
async fn should_not_consult_fallback_when_primary_succeeds() {
    let primary = StubReader::new("primary", Behaviour::Succeed);
    let secondary = StubReader::new("secondary", Behaviour::Succeed);
    let chain = WeatherChain::new(readers(&[&primary, &secondary]));

    chain.daily("London").await.unwrap();
    chain.hourly("London").await.unwrap();

    assert_eq!(primary.calls(), 2);
    assert_eq!(secondary.calls(), 0);
}

#[tokio::test]
async fn should_return_last_error_when_every_node_fails() {
    let chain = WeatherChain::new(readers(&[
        &StubReader::new("primary", Behaviour::NotFound),
        &StubReader::new("secondary", Behaviour::Unavailable),
    ]));
    let result = chain.current("Atlantis").await;
    assert!(
        matches!(result, Err(ProviderError::Unavailable { provider: "secondary", .. })),
        "expected secondary unavailable, got {result:?}"
    );

    let chain = WeatherChain::new(readers(&[
        &StubReader::new("primary", Behaviour::Unavailable),
        &StubReader::new("secondary", Behaviour::NotFound),
    ]));
    let result = chain.current("Atlantis").await;
    assert!(matches!(result, Err(ProviderError::CityNotFound(ref c)) if c == "Atlantis"));
}

#[tokio::test]
async fn should_report_unavailable_when_chain_is_empty() {
    let chain = WeatherChain::new(Vec::<Arc<dyn WeatherReader>>::new());
    assert!(chain.is_empty());
    let result = chain.current("London").await;
    assert!(matches!(result, Err(ProviderError::Unavailable { .. })));
}

// ── ValidatorChain ───────────────────────────────────────────────────────────

#[tokio::test]
async fn should_validate_through_fallback() {
    let primary = StubValidator::new("geocoding", Behaviour::Unavailable);
    let secondary = StubValidator::new("search", Behaviour::Succeed);
    let chain = ValidatorChain::new(validators(&[&primary, &secondary]));

    assert_eq!(chain.validate("lONDON").await.unwrap(), "London");
    assert_eq!(primary.calls(), 1);
    assert_eq!(secondary.calls(), 1);
}

#[tokio::test]
async fn should_report_not_found_when_no_validator_knows_city() {
    let chain = ValidatorChain::new(validators(&[
        &StubValidator::new("geocoding", Behaviour::NotFound),
        &StubValidator::new("search", Behaviour::NotFound),
    ]));
    let result = chain.validate("Atlantis").await;
    assert!(matches!(result, Err(ProviderError::CityNotFound(_))));
}
