//! Universal error handling for the API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::marker_storage::StorageError;

/// API error response envelope that matches the map client expectations
#[derive(Debug, Serialize)]
struct ApiErrorResponse {
    /// Human-readable error message
    error: &'static str,
}

/// Application error type that wraps the API error response
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: &'static str,
}

impl AppError {
    /// Create a new application error
    #[must_use]
    pub const fn new(status: StatusCode, message: &'static str) -> Self {
        Self { status, message }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error based on status code
        match self.status.as_u16() {
            400..=499 => tracing::warn!("Client error: {}", self.message),
            500..=599 => tracing::error!("Server error: {}", self.message),
            _ => {}
        }

        (
            self.status,
            Json(ApiErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Convert storage errors to application errors
///
/// The wire contract hides the underlying cause behind a generic message;
/// the cause is logged server-side only.
impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        use StorageError::{AwsError, ConfigError, S3Error, UpstreamError};

        match &err {
            UpstreamError(msg) => tracing::error!("S3 upstream error: {msg}"),
            S3Error(msg) | AwsError(msg) => tracing::error!("S3/AWS error: {msg}"),
            ConfigError(msg) => tracing::error!("Configuration error: {msg}"),
        }

        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to generate signed URLs",
        )
    }
}
