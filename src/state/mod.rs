// State management module
// Holds the application context shared by all request handlers

pub mod app_state;

pub use app_state::AppState;
