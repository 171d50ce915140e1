//! HTTP error handling and response conversion.
//!
//! Try-on failures are rendered as placeholder images, not errors; this type
//! only covers requests the relay cannot process at all (malformed multipart
//! bodies, oversized uploads, failures to encode the response image).

use crate::domain::tryon::errors::TryOnError;
use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Application-level errors returned from handlers.
#[derive(Debug)]
pub enum AppError {
    /// Request could not be parsed (400).
    BadRequest(String),

    /// Upload exceeds the configured body limit (413).
    PayloadTooLarge,

    /// Unclassified internal error (500).
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            Self::PayloadTooLarge => write!(f, "Payload too large"),
            Self::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl AppError {
    /// Get the appropriate HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a user-safe error message (without implementation details).
    fn user_message(&self) -> String {
        match self {
            Self::BadRequest(msg) => msg.clone(),
            Self::PayloadTooLarge => "Images are too large".into(),
            Self::Internal(_) => "Internal server error".into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.user_message();

        match status {
            StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("error={}", self);
            }
            _ => {
                tracing::warn!("error={}", self);
            }
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

// === Domain Error Conversion ===

// Remote failures never get here: dispatch renders them as placeholders.
// What remains is local, such as encoding the response image.
impl From<TryOnError> for AppError {
    fn from(err: TryOnError) -> Self {
        match err {
            TryOnError::MissingInput | TryOnError::InvalidInput(_) => {
                AppError::BadRequest(err.to_string())
            }
            other => {
                tracing::error!(tryon_error = %other);
                AppError::Internal(other.to_string())
            }
        }
    }
}

// === Multipart Error Conversion ===

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            tracing::warn!(multipart_error = %err, "Upload exceeds body limit");
            AppError::PayloadTooLarge
        } else {
            tracing::warn!(multipart_error = %err);
            AppError::BadRequest(err.body_text())
        }
    }
}
