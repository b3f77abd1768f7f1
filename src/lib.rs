//! User Service Library
//!
//! This library exposes modules for testing and external use.
//! The main binary is in `src/main.rs`.

pub mod api;
pub mod config;
pub mod error;
pub mod server;
/// Application state management
///
/// Holds the shared context handed to every request handler.
pub mod state;
pub mod users;
