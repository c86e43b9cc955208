//! Application state shared across handlers

use std::sync::Arc;

use sqlx::PgPool;

use crate::assistant::ChatBackend;
use crate::realtime::MessageHub;

/// Shared application state, held as `Arc<AppState>` by the router
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// Fan-out for new direct messages
    pub hub: MessageHub,
    /// `None` when no assistant API key is configured
    pub assistant: Option<Arc<dyn ChatBackend>>,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            hub: MessageHub::default(),
            assistant: None,
        }
    }

    pub fn with_assistant(mut self, backend: Arc<dyn ChatBackend>) -> Self {
        self.assistant = Some(backend);
        self
    }
}
