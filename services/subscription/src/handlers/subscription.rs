use axum::Json;
use axum::extract::{Form, Path, State};
use serde::{Deserialize, Serialize};

use crate::domain::repository::{CityValidatorPort, UnitOfWork};
use crate::error::SubscriptionServiceError;
use crate::state::AppState;
use crate::usecase::subscription::SubscribeInput;

pub const SUBSCRIBED: &str = "Subscription successful. Confirmation email sent.";
pub const CONFIRMED: &str = "Subscription confirmed successfully";
pub const UNSUBSCRIBED: &str = "Unsubscribed successfully";

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_owned(),
        })
    }
}

// ── POST /api/subscribe ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubscribeForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub frequency: String,
}

pub async fn subscribe<U, V>(
    State(state): State<AppState<U, V>>,
    Form(form): Form<SubscribeForm>,
) -> Result<Json<MessageResponse>, SubscriptionServiceError>
where
    U: UnitOfWork + Clone,
    V: CityValidatorPort + Clone,
{
    state
        .subscribe_usecase()
        .execute(SubscribeInput {
            email: form.email,
            city: form.city,
            frequency: form.frequency,
        })
        .await?;
    Ok(MessageResponse::new(SUBSCRIBED))
}

// ── GET /api/confirm/{token} ─────────────────────────────────────────────────

pub async fn confirm<U, V>(
    State(state): State<AppState<U, V>>,
    Path(token): Path<String>,
) -> Result<Json<MessageResponse>, SubscriptionServiceError>
where
    U: UnitOfWork + Clone,
    V: CityValidatorPort + Clone,
{
    state.confirm_usecase().execute(&token).await?;
    Ok(MessageResponse::new(CONFIRMED))
}

// ── GET /api/unsubscribe/{token} ─────────────────────────────────────────────

pub async fn unsubscribe<U, V>(
    State(state): State<AppState<U, V>>,
    Path(token): Path<String>,
) -> Result<Json<MessageResponse>, SubscriptionServiceError>
where
    U: UnitOfWork + Clone,
    V: CityValidatorPort + Clone,
{
    state.unsubscribe_usecase().execute(&token).await?;
    Ok(MessageResponse::new(UNSUBSCRIBED))
}
