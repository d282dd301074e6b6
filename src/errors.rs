use axum::http::{HeaderMap, HeaderValue};
use axum::response::IntoResponse;
use reqwest::StatusCode;
use sqlx::Error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Db(sqlx::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found")]
    NotFound,
    #[error("LLM gateway is busy")]
    LlmBusy,
    #[error("External error: {0}")]
    External(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// Failures of a single outbound LLM call. The gateway performs no retries,
/// so each variant surfaces exactly one failed attempt.
#[derive(Debug, Error)]
pub enum LlmError {
    /// No concurrency slot available right now. Push-back, not queuing.
    #[error("LLM gateway is busy")]
    Busy,
    /// Connection failure or timeout before an HTTP status was received.
    #[error("LLM gateway unreachable: {0}")]
    Unreachable(String),
    /// The backend answered with a non-2xx status. Body is truncated for logs.
    #[error("LLM gateway rejected request (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("Invalid LLM response: {0}")]
    InvalidResponse(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found").into_response(),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized").into_response(),
            AppError::LlmBusy => {
                let mut headers = HeaderMap::new();
                headers.insert("Retry-After", HeaderValue::from_static("60"));
                (StatusCode::TOO_MANY_REQUESTS, headers, "LLM gateway is busy").into_response()
            },
            AppError::External(msg) => (StatusCode::BAD_GATEWAY, msg).into_response(),
            AppError::Db(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response(),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(value: Error) -> Self {
        AppError::Db(value)
    }
}

impl From<String> for AppError {
    fn from(value: String) -> Self {
        AppError::Validation(value)
    }
}

impl From<LlmError> for AppError {
    fn from(value: LlmError) -> Self {
        match value {
            LlmError::Busy => AppError::LlmBusy,
            other => AppError::External(other.to_string()),
        }
    }
}
