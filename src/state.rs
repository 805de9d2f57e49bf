use std::sync::Arc;

use crate::{
    config::StoreConfig,
    retry::RetryPolicy,
    store::{DocumentStore, IdGenerator, MemoryStore, UuidIdGenerator},
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub ids: Arc<dyn IdGenerator>,
    pub config: Arc<StoreConfig>,
    pub retry: RetryPolicy,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, config: StoreConfig, retry: RetryPolicy) -> Self {
        Self {
            store,
            ids: Arc::new(UuidIdGenerator),
            config: Arc::new(config),
            retry,
        }
    }

    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// State over a fresh [`MemoryStore`] with default collections.
    pub fn in_memory(retry: RetryPolicy) -> Self {
        Self::new(Arc::new(MemoryStore::new()), StoreConfig::default(), retry)
    }
}
