//! In-process domain events.
//!
//! Each event name maps to exactly one broker queue of the same name.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::subscription::{Frequency, Subscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    UserSubscribed,
    WeatherUpdated,
}

impl EventName {
    pub const ALL: [EventName; 2] = [EventName::UserSubscribed, EventName::WeatherUpdated];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserSubscribed => "user_subscribed",
            Self::WeatherUpdated => "weather_updated",
        }
    }

    /// Queue carrying this event on the bus.
    pub fn queue(self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| format!("unknown event {s:?}"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserSubscribed {
    pub id: Uuid,
    pub email: String,
    pub city: String,
    pub frequency: Frequency,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherUpdated {
    pub email: String,
    pub city: String,
    pub frequency: Frequency,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    UserSubscribed(UserSubscribed),
    WeatherUpdated(WeatherUpdated),
}

impl Event {
    pub fn name(&self) -> EventName {
        match self {
            Self::UserSubscribed(_) => EventName::UserSubscribed,
            Self::WeatherUpdated(_) => EventName::WeatherUpdated,
        }
    }

    pub fn user_subscribed(sub: &Subscription) -> Self {
        Self::UserSubscribed(UserSubscribed {
            id: sub.id,
            email: sub.email.clone(),
            city: sub.city.clone(),
            frequency: sub.frequency,
            token: sub.token.clone(),
        })
    }

    pub fn weather_updated(sub: &Subscription) -> Self {
        Self::WeatherUpdated(WeatherUpdated {
            email: sub.email.clone(),
            city: sub.city.clone(),
            frequency: sub.frequency,
            token: sub.token.clone(),
        })
    }
}
