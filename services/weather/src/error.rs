use axum::response::{IntoResponse, Response};
use skycast_core::error::{ErrorKind, error_response, error_status};

use crate::domain::provider::ProviderError;

/// Weather service error variants.
#[derive(Debug, thiserror::Error)]
pub enum WeatherServiceError {
    #[error("city is required")]
    EmptyCity,
    #[error("City not found")]
    CityNotFound(String),
    #[error("weather provider unavailable")]
    Unavailable,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl WeatherServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyCity => ErrorKind::InvalidInput,
            Self::CityNotFound(_) => ErrorKind::NotFound,
            Self::Unavailable => ErrorKind::ServiceUnavailable,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    fn log(&self) {
        if let Self::Internal(e) = self {
            tracing::error!(error = ?e, kind = "INTERNAL", "internal error");
        }
    }
}

impl From<ProviderError> for WeatherServiceError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::CityNotFound(city) => Self::CityNotFound(city),
            ProviderError::Unavailable { provider, source } => {
                tracing::warn!(provider, error = ?source, "all providers unavailable");
                Self::Unavailable
            }
        }
    }
}

impl IntoResponse for WeatherServiceError {
    fn into_response(self) -> Response {
        self.log();
        error_response(self.kind(), self.to_string())
    }
}

impl From<WeatherServiceError> for tonic::Status {
    fn from(err: WeatherServiceError) -> Self {
        err.log();
        error_status(err.kind(), err.to_string())
    }
}
