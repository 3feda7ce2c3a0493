use std::sync::Arc;

use crate::config::AppConfig;
use crate::storage::{FileStore, MemoryFileStore};
use crate::store::{ContentStore, MemoryStore};

/// Shared handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContentStore>,
    pub files: Arc<dyn FileStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ContentStore>,
        files: Arc<dyn FileStore>,
        config: AppConfig,
    ) -> Self {
        Self {
            store,
            files,
            config: Arc::new(config),
        }
    }

    /// Fully in-memory state with default configuration.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryFileStore::new()),
            AppConfig::default(),
        )
    }
}
