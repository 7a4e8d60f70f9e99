use std::sync::Arc;

use crate::domain::backend::{SubscriptionBackend, WeatherBackend};

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub subscriptions: Arc<dyn SubscriptionBackend>,
    pub weather: Arc<dyn WeatherBackend>,
}
