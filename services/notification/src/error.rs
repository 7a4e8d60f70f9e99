use axum::response::{IntoResponse, Response};
use skycast_core::error::{ErrorKind, error_response, error_status};
use skycast_messaging::consumer::HandlerError;

/// Notification service error variants.
#[derive(Debug, thiserror::Error)]
pub enum NotificationServiceError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("City not found")]
    CityNotFound,
    #[error("{0}")]
    Unavailable(String),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl NotificationServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::CityNotFound => ErrorKind::NotFound,
            Self::Unavailable(_) => ErrorKind::ServiceUnavailable,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    fn log(&self) {
        if let Self::Internal(e) = self {
            tracing::error!(error = ?e, kind = "INTERNAL", "internal error");
        }
    }
}

/// Consumers reject the delivery; the cause travels with it for the log line.
impl From<NotificationServiceError> for HandlerError {
    fn from(err: NotificationServiceError) -> Self {
        HandlerError::Failed(anyhow::Error::new(err))
    }
}

impl IntoResponse for NotificationServiceError {
    fn into_response(self) -> Response {
        self.log();
        error_response(self.kind(), self.to_string())
    }
}

impl From<NotificationServiceError> for tonic::Status {
    fn from(err: NotificationServiceError) -> Self {
        err.log();
        error_status(err.kind(), err.to_string())
    }
}
