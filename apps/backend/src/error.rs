//! Error handling for the backend API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use srs_core::StudyError;
use thiserror::Error;

use crate::db::DbError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Study(#[from] StudyError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Study(e) => match e {
                StudyError::InvalidQuality(_) => (StatusCode::BAD_REQUEST, "invalid_quality"),
                StudyError::AccessDenied { .. } => (StatusCode::FORBIDDEN, "access_denied"),
                StudyError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "session_not_found"),
                StudyError::SessionClosed(_) => (StatusCode::CONFLICT, "session_closed"),
                StudyError::CardMismatch { .. } => (StatusCode::CONFLICT, "card_mismatch"),
                StudyError::AlreadyOnBreak => (StatusCode::CONFLICT, "already_on_break"),
                StudyError::NotOnBreak => (StatusCode::CONFLICT, "not_on_break"),
                StudyError::Conflict { .. } => (StatusCode::CONFLICT, "conflict"),
                StudyError::EmptyDeck { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "empty_deck"),
                StudyError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
            },
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_kind();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, kind = error_type, "request rejected");
        }

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

/// Result type alias for API operations
pub type Result<T> = std::result::Result<T, ApiError>;
