//! User data models
//!
//! Defines the stored user record.

use sqlx::FromRow;

/// Unique identifier for a user, assigned by the database
pub type UserId = i64;

/// A stored user record
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    /// Auto-assigned primary key
    pub id: UserId,
    /// Unique display name
    pub name: String,
    /// Unique email address
    pub email: String,
    /// When the user was created (Unix timestamp)
    pub created_at: i64,
    /// When the user was last modified (Unix timestamp)
    pub updated_at: i64,
}

/// Fields to change on an existing user
///
/// `None` leaves the stored value as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    /// New name, if any
    pub name: Option<String>,
    /// New email, if any
    pub email: Option<String>,
}

impl UserChanges {
    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}
