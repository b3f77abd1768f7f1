// Application state management
// Built once at startup and cloned into every handler

use crate::users::UserDb;
use std::sync::Arc;

/// Application context injected into handlers through axum's `State`
///
/// Cloning is cheap: only the `Arc` is copied.
#[derive(Debug, Clone)]
pub struct AppState {
    /// User storage, shared read-only across requests
    pub users: Arc<UserDb>,
}

impl AppState {
    /// Create the application state around an open user store
    pub fn new(users: UserDb) -> Self {
        Self {
            users: Arc::new(users),
        }
    }
}
