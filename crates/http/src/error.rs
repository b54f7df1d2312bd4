//! Error handling for the bookshelf HTTP layer

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use uuid::Uuid;

use crate::envelope::Envelope;

/// Message returned for every internal failure; details only go to the logs.
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal server error occurred";

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error on '{field}': {message}")]
    Validation {
        field: String,
        code: String,
        message: String,
    },

    #[error("not found: {message}")]
    NotFound { message: String, code: String },

    #[error("bad request: {message}")]
    BadRequest { message: String, code: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a validation error for a single payload field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            code: "validation_error".to_string(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            code: "not_found".to_string(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            code: "bad_request".to_string(),
        }
    }

    /// HTTP status this error is reported with
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::bad_request(format!(
            "invalid request payload: {}",
            rejection.body_text()
        ))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::bad_request(format!("invalid query string: {}", rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            AppError::Validation {
                field,
                code,
                message,
            } => {
                tracing::debug!(error_code = %code, field = %field, "request rejected: {}", message);
                Envelope::fail(message)
            }
            AppError::NotFound { message, code } | AppError::BadRequest { message, code } => {
                tracing::debug!(
                    error_code = %code,
                    status_code = %status.as_u16(),
                    "request rejected: {}",
                    message
                );
                Envelope::fail(message)
            }
            AppError::Internal(e) => {
                let error_id = Uuid::new_v4();
                tracing::error!(
                    error_id = %error_id,
                    error_code = "internal_error",
                    status_code = %status.as_u16(),
                    "request failed: {:#}",
                    e
                );
                Envelope::error(INTERNAL_ERROR_MESSAGE)
            }
        };

        (status, Json(body)).into_response()
    }
}
