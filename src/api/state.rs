//! Application state for shared services

use std::sync::Arc;

use crate::domain::cache::Cache;
use crate::infrastructure::services::ExternalDataFetcher;

/// Shared handles passed to every handler
#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<ExternalDataFetcher>,
}

impl AppState {
    pub fn new(fetcher: Arc<ExternalDataFetcher>) -> Self {
        Self { fetcher }
    }

    pub fn cache(&self) -> &Arc<dyn Cache> {
        self.fetcher.cache()
    }
}
