use std::sync::Arc;

use crate::chat::SessionManager;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Prompt cache, conversation store and upstream client.
    pub sessions: Arc<SessionManager>,
}
