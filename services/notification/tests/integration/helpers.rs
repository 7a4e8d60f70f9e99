use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use skycast_domain::subscription::Frequency;
use skycast_domain::weather::{DailyForecast, Forecast, HourlyForecast};
use skycast_messaging::memory::InMemoryBroker;
use skycast_messaging::{BusMessage, Publisher};
use tokio_util::sync::CancellationToken;

use skycast_notification::domain::ports::{Email, Mailer, WeatherPort};
use skycast_notification::error::NotificationServiceError;

// ── RecordingMailer ──────────────────────────────────────────────────────────

/// Records every email it accepts. Can be told to fail the next `n` sends.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<Email>>,
    attempts: AtomicUsize,
    fail_next: AtomicUsize,
}

impl RecordingMailer {
    pub fn failing_first(n: usize) -> Self {
        Self {
            fail_next: AtomicUsize::new(n),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: Email) -> Result<(), NotificationServiceError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let remaining = self.fail_next.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next.store(remaining - 1, Ordering::SeqCst);
            return Err(anyhow::anyhow!("smtp: 421 service not available").into());
        }
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

// ── StubWeather ──────────────────────────────────────────────────────────────

/// Fixed forecasts for any city.
#[derive(Default)]
pub struct StubWeather {
    unavailable: AtomicBool,
    lookups: Mutex<Vec<(String, Frequency)>>,
}

impl StubWeather {
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn lookups(&self) -> Vec<(String, Frequency)> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl WeatherPort for StubWeather {
    async fn forecast(
        &self,
        city: &str,
        frequency: Frequency,
    ) -> Result<Forecast, NotificationServiceError> {
        self.lookups
            .lock()
            .unwrap()
            .push((city.to_owned(), frequency));
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(NotificationServiceError::Unavailable(
                "weather service unavailable".into(),
            ));
        }
        Ok(match frequency {
            Frequency::Daily => Forecast::Daily(DailyForecast {
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
            }),
            Frequency::Hourly => Forecast::Hourly(HourlyForecast {
                location: city.to_owned(),
                time: "2025-06-01 14:00".into(),
                temp_c: 21.0,
                will_it_rain: false,
                chance_rain: 10,
                will_it_snow: false,
                chance_snow: 0,
                condition: "Sunny".into(),
                icon: String::new(),
            }),
        })
    }
}

// ── Broker helpers ───────────────────────────────────────────────────────────

/// Queue `messages` and close the queue so a consumer returns once drained.
pub async fn enqueue(broker: &InMemoryBroker, queue: &str, messages: Vec<BusMessage>) {
    for message in messages {
        broker.publish(queue, message).await.unwrap();
    }
    broker.close_queue(queue);
}

pub fn never_cancelled() -> CancellationToken {
    CancellationToken::new()
}
