use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Canonical error kind shared by every service, independent of transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    Conflict,
    /// Reserved; no current endpoint authenticates callers.
    Unauthorized,
    ServiceUnavailable,
    Internal,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::InvalidInput => "INVALID_INPUT",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::Internal => "INTERNAL",
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn grpc_code(self) -> tonic::Code {
        match self {
            Self::InvalidInput => tonic::Code::InvalidArgument,
            Self::NotFound => tonic::Code::NotFound,
            Self::Conflict => tonic::Code::AlreadyExists,
            Self::Unauthorized => tonic::Code::Unauthenticated,
            Self::ServiceUnavailable => tonic::Code::Unavailable,
            Self::Internal => tonic::Code::Internal,
        }
    }

    /// Reverse mapping used by callers of a gRPC back-end.
    pub fn from_grpc(code: tonic::Code) -> Self {
        match code {
            tonic::Code::InvalidArgument | tonic::Code::OutOfRange => Self::InvalidInput,
            tonic::Code::NotFound => Self::NotFound,
            tonic::Code::AlreadyExists => Self::Conflict,
            tonic::Code::Unauthenticated | tonic::Code::PermissionDenied => Self::Unauthorized,
            tonic::Code::Unavailable | tonic::Code::DeadlineExceeded => Self::ServiceUnavailable,
            _ => Self::Internal,
        }
    }
}

/// Marker placed in the extensions of every error response so that
/// [`crate::middleware::error_envelope`] can expand it with request data.
#[derive(Debug, Clone)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub description: String,
}

/// Build a `{code, description}` JSON error response for `kind`.
pub fn error_response(kind: ErrorKind, description: impl Into<String>) -> Response {
    let description = description.into();
    let body = serde_json::json!({
        "code": kind.code(),
        "description": description,
    });
    let mut response = (kind.status(), axum::Json(body)).into_response();
    response
        .extensions_mut()
        .insert(ErrorBody { kind, description });
    response
}

/// Build a gRPC status for `kind`.
pub fn error_status(kind: ErrorKind, description: impl Into<String>) -> tonic::Status {
    tonic::Status::new(kind.grpc_code(), description.into())
}

/// Common application error variants, used directly by the gateway and as the
/// translation target for back-end statuses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    ServiceUnavailable(String),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::ServiceUnavailable(_) => ErrorKind::ServiceUnavailable,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Translate a status returned by a back-end. The back-end's message is
    /// kept for client errors; internal details are not forwarded.
    pub fn from_status(status: &tonic::Status) -> Self {
        let message = status.message().to_owned();
        match ErrorKind::from_grpc(status.code()) {
            ErrorKind::InvalidInput => Self::InvalidInput(message),
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::Conflict => Self::Conflict(message),
            ErrorKind::Unauthorized => Self::Unauthorized(message),
            ErrorKind::ServiceUnavailable => Self::ServiceUnavailable(message),
            ErrorKind::Internal => Self::Internal(anyhow::anyhow!(
                "back-end returned {:?}: {}",
                status.code(),
                message
            )),
        }
    }
}

impl From<AppError> for tonic::Status {
    fn from(err: AppError) -> Self {
        if let AppError::Internal(ref e) = err {
            tracing::error!(error = ?e, kind = "INTERNAL", "internal error");
        }
        error_status(err.kind(), err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log 500s only; TraceLayer already records every request.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = ?e, kind = "INTERNAL", "internal error");
        }
        error_response(self.kind(), self.to_string())
    }
}
