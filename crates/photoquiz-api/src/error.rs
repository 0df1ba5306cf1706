//! Photo quiz API error types.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use photoquiz_core::error::StoreError;
use photoquiz_core::situation::SituationId;
use photoquiz_round::RoundError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Tracing or span export could not be set up.
    #[error("telemetry error: {0}")]
    Telemetry(String),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// Everything a handler can fail with, mapped onto HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Failure reported by the round engine or the store beneath it.
    #[error(transparent)]
    Round(#[from] RoundError),

    /// No game session exists, or it is no longer active.
    #[error("no active game session")]
    SessionNotFound,

    /// The requested situation does not exist.
    #[error("situation {0} not found")]
    SituationNotFound(SituationId),

    /// The request was malformed or violated an input limit.
    #[error("{0}")]
    Validation(String),

    /// The admin token was missing or wrong.
    #[error("admin token missing or invalid")]
    Forbidden,
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Round(RoundError::Store(err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Round(RoundError::NotStarted) => (StatusCode::CONFLICT, "round_not_started"),
            Self::Round(RoundError::NoMorePhotos) => (StatusCode::CONFLICT, "no_more_photos"),
            Self::Round(RoundError::NoSituationsAvailable) => {
                (StatusCode::NOT_FOUND, "no_situations_available")
            }
            Self::Round(RoundError::Store(StoreError::Cancelled)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "cancelled")
            }
            Self::Round(RoundError::Store(StoreError::Validation(_))) | Self::Validation(_) => {
                (StatusCode::BAD_REQUEST, "validation_error")
            }
            Self::Round(RoundError::Store(StoreError::Database(_))) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "store_error")
            }
            Self::SessionNotFound => (StatusCode::NOT_FOUND, "session_not_found"),
            Self::SituationNotFound(_) => (StatusCode::NOT_FOUND, "situation_not_found"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();
        if status.is_server_error() {
            error!(error = %self, code = error_code, "request failed");
        }

        let body = ErrorBody {
            error: error_code,
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
