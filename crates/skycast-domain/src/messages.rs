//! JSON bodies exchanged over the bus.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::subscription::Frequency;

/// Body of a `user_subscribed` message. `url` is the absolute confirmation link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSubscribedMessage {
    pub message_id: Uuid,
    pub email: String,
    pub city: String,
    pub frequency: Frequency,
    pub url: String,
}

/// Body of a `weather_updated` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherUpdatedMessage {
    pub email: String,
    pub city: String,
    pub frequency: Frequency,
    pub unsubscribe_url: String,
}
