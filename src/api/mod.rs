//! API module
//!
//! Contains HTTP request handlers for user management endpoints

pub mod users;

pub use users::{UserArgs, UserIdPath, UserResponse};
