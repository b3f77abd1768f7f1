//! Error types and error handling for the application
//!
//! This module defines the errors handlers can return. All of them implement
//! `IntoResponse` and render as `{"message": ...}` with a matching status.

use crate::users::{StoreError, UserId};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error types
#[derive(Error, Debug)]
pub enum AppError {
    /// A required field was missing or empty
    #[error("{0}")]
    Validation(String),

    /// The request body could not be parsed
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Another user already has this name or email
    #[error("User with this name or email already exists.")]
    Conflict,

    /// User with the given ID was not found
    #[error("User not found.")]
    UserNotFound(UserId),

    /// An item path id too large to belong to any stored user
    #[error("User not found.")]
    UserIdOutOfRange(String),

    /// No route matches the request path
    #[error("The requested URL was not found on the server.")]
    RouteNotFound,

    /// The path exists but does not accept this method
    #[error("The method is not allowed for the requested URL.")]
    MethodNotAllowed,

    /// Internal server error (catch-all for unexpected errors)
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict => StatusCode::BAD_REQUEST,
            AppError::UserNotFound(_) => StatusCode::NOT_FOUND,
            AppError::UserIdOutOfRange(_) => StatusCode::NOT_FOUND,
            AppError::RouteNotFound => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => AppError::UserNotFound(id),
            StoreError::Conflict(detail) => {
                tracing::debug!(detail = %detail, "Rejected write on uniqueness constraint");
                AppError::Conflict
            }
            StoreError::Database(e) => AppError::Internal(anyhow::Error::new(e)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            AppError::Internal(e) => {
                tracing::error!(error = %e, "Request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
