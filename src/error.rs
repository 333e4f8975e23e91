use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

/// Errors raised while validating the admission policy at startup.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("refill rate must be a positive, finite number of tokens per second")]
    InvalidRate,

    #[error("burst capacity must be at least 1")]
    InvalidBurst,

    #[error("idle timeout must be greater than zero")]
    InvalidIdleTimeout,
}

/// Failure to derive a client key from an inbound request.
///
/// These indicate an environment problem rather than client misbehaviour,
/// so the HTTP layer maps them to a server error instead of a rate-limit
/// rejection. Either way the request is never admitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdmissionError {
    #[error("request carries no peer address")]
    MissingClientAddress,

    #[error("unable to parse client address {0:?}")]
    UnparseableClientAddress(String),
}

impl IntoResponse for AdmissionError {
    fn into_response(self) -> Response {
        error!(error = %self, "failing closed on request without a usable client key");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Unable to determine client address",
        )
            .into_response()
    }
}

/// Errors reported by a paste store implementation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("paste {0} not found")]
    NotFound(String),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Errors returned by the paste handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Paste not found")]
    NotFound,

    #[error("Invalid paste ID")]
    InvalidId,

    #[error("Content is required")]
    MissingContent,

    #[error("Storage error: {0}")]
    Store(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::NotFound,
            StoreError::Backend(msg) => ApiError::Store(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidId | Self::MissingContent => StatusCode::BAD_REQUEST,
            Self::Store(ref msg) => {
                error!(error = %msg, "paste store failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, self.to_string()).into_response()
    }
}
