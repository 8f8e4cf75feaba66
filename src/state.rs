use std::sync::Arc;

use crate::config::Config;
use crate::services::EmailClassifier;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub classifier: Arc<dyn EmailClassifier>,
}

impl AppState {
    pub fn new(config: Config, classifier: Arc<dyn EmailClassifier>) -> Self {
        Self {
            config: Arc::new(config),
            classifier,
        }
    }
}
