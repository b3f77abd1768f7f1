//! Users module
//!
//! Handles user record storage using an SQLite database.

pub mod db;
pub mod error;
pub mod models;

pub use db::UserDb;
pub use error::StoreError;
pub use models::{User, UserChanges, UserId};
