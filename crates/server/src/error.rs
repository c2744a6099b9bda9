//! The single translation point from service errors to HTTP responses.
//! Services return plain `Result`s; handlers bubble them up with `?` and
//! this module decides status code, error code, and payload.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use services::services::{
    fields::FieldServiceError, forms::FormServiceError, publication::PublicationError,
    submissions::SubmissionError,
};
use thiserror::Error;
use tracing::error;
use utils::response::{ApiResponse, ErrorCode};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{message}")]
    Validation {
        message: String,
        details: Option<serde_json::Value>,
    },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, ErrorCode::NotFound, message, None)
            }
            ApiError::Forbidden(message) => {
                (StatusCode::FORBIDDEN, ErrorCode::Forbidden, message, None)
            }
            ApiError::Validation { message, details } => (
                StatusCode::BAD_REQUEST,
                ErrorCode::ValidationError,
                message,
                details,
            ),
            ApiError::Internal(cause) => {
                // Log the cause server-side; clients get a generic message.
                error!(error = ?cause, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::InternalError,
                    "internal server error".to_string(),
                    None,
                )
            }
        };

        let body = match details {
            Some(details) => ApiResponse::<()>::error_with_details(code, message, details),
            None => ApiResponse::<()>::error(code, message),
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        ApiError::Internal(error.into())
    }
}

impl From<FormServiceError> for ApiError {
    fn from(error: FormServiceError) -> Self {
        match error {
            FormServiceError::NotFound => ApiError::NotFound(error.to_string()),
            FormServiceError::PublishedImmutable => ApiError::Forbidden(error.to_string()),
            FormServiceError::Validation(message) => ApiError::validation(message),
            FormServiceError::Database(e) => ApiError::Internal(e.into()),
        }
    }
}

impl From<FieldServiceError> for ApiError {
    fn from(error: FieldServiceError) -> Self {
        match error {
            FieldServiceError::FormNotFound | FieldServiceError::FieldNotFound => {
                ApiError::NotFound(error.to_string())
            }
            FieldServiceError::PublishedImmutable => ApiError::Forbidden(error.to_string()),
            FieldServiceError::Validation(message) => ApiError::validation(message),
            FieldServiceError::Database(e) => ApiError::Internal(e.into()),
        }
    }
}

impl From<PublicationError> for ApiError {
    fn from(error: PublicationError) -> Self {
        match error {
            PublicationError::NotFound => ApiError::NotFound(error.to_string()),
            // A repeated publish is a client mistake, not a forbidden state.
            PublicationError::AlreadyPublished | PublicationError::NoFields => {
                ApiError::validation(error.to_string())
            }
            PublicationError::Database(e) => ApiError::Internal(e.into()),
        }
    }
}

impl From<SubmissionError> for ApiError {
    fn from(error: SubmissionError) -> Self {
        match error {
            SubmissionError::NotFound => ApiError::NotFound(error.to_string()),
            SubmissionError::NotPublished => ApiError::Forbidden(error.to_string()),
            SubmissionError::Invalid {
                field_id,
                field_label,
                message,
            } => ApiError::Validation {
                message: format!("{field_label} {message}"),
                details: Some(json!({
                    "field_id": field_id,
                    "field_label": field_label,
                })),
            },
            SubmissionError::Serialize(e) => ApiError::Internal(e.into()),
            SubmissionError::Database(e) => ApiError::Internal(e.into()),
        }
    }
}
