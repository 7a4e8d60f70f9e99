use axum::Json;
use axum::extract::{Form, Path, State};
use serde::{Deserialize, Serialize};

use skycast_core::error::AppError;

use crate::domain::backend::SubscribeRequest;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

fn required(value: String, field: &str) -> Result<String, AppError> {
    let value = value.trim().to_owned();
    if value.is_empty() {
        return Err(AppError::InvalidInput(format!("{field} is required")));
    }
    Ok(value)
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

pub async fn subscribe(
    State(state): State<AppState>,
    Form(form): Form<SubscribeForm>,
) -> Result<Json<MessageResponse>, AppError> {
    let request = SubscribeRequest {
        email: required(form.email, "email")?,
        city: required(form.city, "city")?,
        frequency: required(form.frequency, "frequency")?,
    };
    let message = state.subscriptions.subscribe(request).await?;
    Ok(Json(MessageResponse { message }))
}

// ── GET /api/confirm/{token} ─────────────────────────────────────────────────

pub async fn confirm(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let token = required(token, "token")?;
    let message = state.subscriptions.confirm(&token).await?;
    Ok(Json(MessageResponse { message }))
}

// ── GET /api/unsubscribe/{token} ─────────────────────────────────────────────

pub async fn unsubscribe(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let token = required(token, "token")?;
    let message = state.subscriptions.unsubscribe(&token).await?;
    Ok(Json(MessageResponse { message }))
}

/// `GET /api/confirm/` and `GET /api/unsubscribe/` with nothing after the slash.
pub async fn missing_token() -> AppError {
    AppError::InvalidInput("token is required".into())
}
