use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::ChatModel;
use crate::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Chat-completion backend. `LlmClient` in production, a scripted stub in tests.
    pub llm: Arc<dyn ChatModel>,
    pub sessions: SessionStore,
    pub config: Config,
}

impl AppState {
    pub fn new(llm: Arc<dyn ChatModel>, config: Config) -> Self {
        Self {
            llm,
            sessions: SessionStore::new(config.session_idle_ttl()),
            config,
        }
    }
}
