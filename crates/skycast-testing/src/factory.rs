//! Subscription and bus-body factories.

use chrono::Utc;
use skycast_domain::messages::{UserSubscribedMessage, WeatherUpdatedMessage};
use skycast_domain::subscription::{Frequency, Subscription};
use uuid::Uuid;

pub const TEST_EMAIL: &str = "test@example.com";

pub fn subscription(email: &str, city: &str, frequency: Frequency) -> Subscription {
    Subscription::new(email, city, frequency).expect("valid test subscription")
}

pub fn confirmed(email: &str, city: &str, frequency: Frequency) -> Subscription {
    let mut sub = subscription(email, city, frequency);
    sub.confirm();
    sub
}

/// `count` confirmed subscribers spread round-robin over `cities`.
pub fn confirmed_many(count: usize, cities: &[&str], frequency: Frequency) -> Vec<Subscription> {
    (0..count)
        .map(|i| {
            let city = cities[i % cities.len()];
            confirmed(&format!("user{i}@example.com"), city, frequency)
        })
        .collect()
}

pub fn user_subscribed_body(city: &str, frequency: Frequency) -> UserSubscribedMessage {
    UserSubscribedMessage {
        message_id: Uuid::new_v4(),
        email: TEST_EMAIL.to_owned(),
        city: city.to_owned(),
        frequency,
        url: format!("https://skycast.test/api/confirm/{}", Uuid::new_v4().simple()),
    }
}

pub fn weather_updated_body(city: &str, frequency: Frequency) -> WeatherUpdatedMessage {
    WeatherUpdatedMessage {
        email: TEST_EMAIL.to_owned(),
        city: city.to_owned(),
        frequency,
        unsubscribe_url: format!(
            "https://skycast.test/api/unsubscribe/{}",
            Utc::now().timestamp_micros()
        ),
    }
}
