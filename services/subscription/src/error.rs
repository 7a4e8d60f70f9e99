use axum::response::{IntoResponse, Response};
use skycast_core::error::{ErrorKind, error_response, error_status};
use skycast_domain::subscription::DomainError;
use skycast_messaging::dispatcher::DispatchError;

/// Subscription service error variants.
#[derive(Debug, thiserror::Error)]
pub enum SubscriptionServiceError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("Invalid city")]
    InvalidCity,
    #[error("Token not found")]
    TokenNotFound,
    #[error("Email already subscribed")]
    AlreadySubscribed,
    #[error("{0}")]
    Unavailable(String),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl SubscriptionServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) | Self::InvalidCity => ErrorKind::InvalidInput,
            Self::TokenNotFound => ErrorKind::NotFound,
            Self::AlreadySubscribed => ErrorKind::Conflict,
            Self::Unavailable(_) => ErrorKind::ServiceUnavailable,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    fn log(&self) {
        if let Self::Internal(e) = self {
            tracing::error!(error = ?e, kind = "INTERNAL", "internal error");
        }
    }
}

impl From<DomainError> for SubscriptionServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidEmail => Self::invalid("Invalid email"),
            DomainError::EmptyCity => Self::invalid("city is required"),
            DomainError::InvalidFrequency(_) => Self::invalid("Invalid frequency"),
        }
    }
}

impl From<DispatchError> for SubscriptionServiceError {
    fn from(err: DispatchError) -> Self {
        Self::Internal(anyhow::Error::new(err))
    }
}

impl IntoResponse for SubscriptionServiceError {
    fn into_response(self) -> Response {
        self.log();
        error_response(self.kind(), self.to_string())
    }
}

impl From<SubscriptionServiceError> for tonic::Status {
    fn from(err: SubscriptionServiceError) -> Self {
        err.log();
        error_status(err.kind(), err.to_string())
    }
}
