use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum_test::TestServer;
use skycast_core::error::AppError;
use skycast_domain::weather::{CurrentWeather, DailyForecast, HourlyForecast};

use skycast_gateway::domain::backend::{SubscribeRequest, SubscriptionBackend, WeatherBackend};
use skycast_gateway::router::build_router;
use skycast_gateway::state::AppState;

// ── StubSubscriptions ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Subscribe(SubscribeRequest),
    Confirm(String),
    Unsubscribe(String),
}

/// Records forwarded calls; answers with the back-end's messages or with a
/// queued error.
#[derive(Default)]
pub struct StubSubscriptions {
    calls: Mutex<Vec<Call>>,
    next_error: Mutex<Option<AppError>>,
}

impl StubSubscriptions {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_next(&self, error: AppError) {
        *self.next_error.lock().unwrap() = Some(error);
    }

    fn record(&self, call: Call, message: &str) -> Result<String, AppError> {
        self.calls.lock().unwrap().push(call);
        match self.next_error.lock().unwrap().take() {
            Some(error) => Err(error),
            None => Ok(message.to_owned()),
        }
    }
}

#[async_trait::async_trait]
impl SubscriptionBackend for StubSubscriptions {
    async fn subscribe(&self, request: SubscribeRequest) -> Result<String, AppError> {
        self.record(
            Call::Subscribe(request),
            "Subscription successful. Confirmation email sent.",
        )
    }

    async fn confirm(&self, token: &str) -> Result<String, AppError> {
        self.record(
            Call::Confirm(token.to_owned()),
            "Subscription confirmed successfully",
        )
    }

    async fn unsubscribe(&self, token: &str) -> Result<String, AppError> {
        self.record(Call::Unsubscribe(token.to_owned()), "Unsubscribed successfully")
    }
}

// ── StubWeather ──────────────────────────────────────────────────────────────

pub const UNKNOWN_CITY: &str = "Atlantis";

#[derive(Default)]
pub struct StubWeather {
    unavailable: AtomicBool,
}

impl StubWeather {
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self, city: &str) -> Result<(), AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::ServiceUnavailable("weather upstream unavailable".into()));
        }
        if city == UNKNOWN_CITY {
            return Err(AppError::NotFound("City not found".into()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl WeatherBackend for StubWeather {
    async fn current(&self, city: &str) -> Result<CurrentWeather, AppError> {
        self.check(city)?;
        Ok(CurrentWeather {
            temperature: 18.5,
            humidity: 62.0,
            description: "Partly cloudy".into(),
        })
    }

    async fn daily(&self, city: &str) -> Result<DailyForecast, AppError> {
        self.check(city)?;
        Ok(DailyForecast {
            location: city.to_owned(),
            date: "2025-06-01".into(),
            max_temp_c: 24.0,
            min_temp_c: 13.5,
            avg_temp_c: 18.7,
            will_it_rain: true,
            chance_rain: 80,
            will_it_snow: false,
            chance_snow: 0,
            condition: "Light rain".into(),
            icon: String::new(),
        })
    }

    async fn hourly(&self, city: &str) -> Result<HourlyForecast, AppError> {
        self.check(city)?;
        Ok(HourlyForecast {
            location: city.to_owned(),
            time: "2025-06-01 14:00".into(),
            temp_c: 21.0,
            will_it_rain: false,
            chance_rain: 10,
            will_it_snow: false,
            chance_snow: 0,
            condition: "Sunny".into(),
            icon: String::new(),
        })
    }

    async fn validate_city(&self, city: &str) -> Result<String, AppError> {
        self.check(city)?;
        if city.eq_ignore_ascii_case("kyiv") {
            return Ok("Kyiv".into());
        }
        Ok(city.to_owned())
    }
}

// ── Harness ──────────────────────────────────────────────────────────────────

pub struct Harness {
    pub subscriptions: Arc<StubSubscriptions>,
    pub weather: Arc<StubWeather>,
    pub server: TestServer,
}

impl Harness {
    pub fn new() -> Self {
        let subscriptions = Arc::new(StubSubscriptions::default());
        let weather = Arc::new(StubWeather::default());
        let state = AppState {
            subscriptions: subscriptions.clone(),
            weather: weather.clone(),
        };
        let server = TestServer::new(build_router(state)).unwrap();
        Self {
            subscriptions,
            weather,
            server,
        }
    }
}
