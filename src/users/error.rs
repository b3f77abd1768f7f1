//! Storage-specific error types
//!
//! Errors returned by the user store. Uniqueness violations are reported as
//! their own variant so callers can react to them without inspecting driver
//! errors.

use crate::users::models::UserId;
use thiserror::Error;

/// Errors that can occur during user storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// No user exists with the given ID
    #[error("User {0} not found")]
    NotFound(UserId),

    /// The write would give two users the same name or email
    #[error("Uniqueness constraint violated: {0}")]
    Conflict(String),

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::Conflict(db_err.message().to_string())
            }
            other => StoreError::Database(other),
        }
    }
}
