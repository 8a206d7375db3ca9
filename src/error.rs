// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::time_utils::TimeInputError;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Ownership violation: {0}")]
    OwnershipViolation(String),

    #[error("Malformed pagination cursor")]
    MalformedCursor,

    #[error("Invalid {field}: {message}")]
    MalformedInput { field: String, message: String },

    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Busy or locked store; the caller decides whether to retry.
    #[error("Store temporarily unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn malformed_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::MalformedInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether this is a transient store failure.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Unavailable(_))
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        match e.sqlite_error_code() {
            Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked) => {
                AppError::Unavailable(e.to_string())
            }
            _ => AppError::Database(e.to_string()),
        }
    }
}

impl From<r2d2::Error> for AppError {
    fn from(e: r2d2::Error) -> Self {
        // Pool checkout only fails on timeout.
        AppError::Unavailable(e.to_string())
    }
}

impl From<TimeInputError> for AppError {
    fn from(e: TimeInputError) -> Self {
        AppError::MalformedInput {
            field: e.field.to_string(),
            message: e.to_string(),
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut field = None;
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::OwnershipViolation(msg) => (
                StatusCode::FORBIDDEN,
                "ownership_violation",
                Some(msg.clone()),
            ),
            AppError::MalformedCursor => (StatusCode::BAD_REQUEST, "malformed_cursor", None),
            AppError::MalformedInput { field: f, message } => {
                field = Some(f.clone());
                (
                    StatusCode::BAD_REQUEST,
                    "malformed_input",
                    Some(message.clone()),
                )
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Unavailable(msg) => {
                tracing::warn!(error = %msg, "Store unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, "unavailable", None)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            field,
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
