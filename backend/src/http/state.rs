//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::DatasetRepository;
use crate::services::SegmentViewBuilder;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn DatasetRepository>,
    /// State table and numeric policy used by every aggregation.
    pub views: Arc<SegmentViewBuilder>,
}

impl AppState {
    pub fn new(repository: Arc<dyn DatasetRepository>) -> Self {
        Self::with_builder(repository, SegmentViewBuilder::default())
    }

    pub fn with_builder(repository: Arc<dyn DatasetRepository>, views: SegmentViewBuilder) -> Self {
        Self {
            repository,
            views: Arc::new(views),
        }
    }
}
