use std::sync::Arc;

use daxcur_core::store::ExampleStore;
use daxcur_core::{CurationConfig, ExampleRepository};
use daxcur_llm::{ChatRouter, DaxCorrector};
use tokio_util::sync::CancellationToken;

/// Shared application state, injected into all route handlers via Axum state.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<ExampleRepository>,
    pub chat: Arc<ChatRouter>,
    pub corrector: Arc<DaxCorrector>,
    pub config: Arc<CurationConfig>,
    /// Fired on shutdown; in-flight chat requests are abandoned.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Wire the repository and chat clients from `config` on top of `store`.
    pub fn new(config: CurationConfig, store: Arc<dyn ExampleStore>) -> Self {
        let repo = ExampleRepository::new(store, config.storage.max_examples);
        Self {
            repo: Arc::new(repo),
            chat: Arc::new(ChatRouter::from_config(&config.chat)),
            corrector: Arc::new(DaxCorrector::from_config(&config.chat)),
            config: Arc::new(config),
            shutdown: CancellationToken::new(),
        }
    }
}
