//! Dataset repository trait.

use std::sync::Arc;

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::db::models::{Dataset, DatasetInfo};
use crate::models::{CodeLookup, DatasetId, FieldCatalog, NormalizedRecord};

/// Storage for normalized datasets.
///
/// Stored datasets are immutable snapshots: readers receive an `Arc` and keep
/// aggregating over it even if the dataset is deleted meanwhile.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait DatasetRepository: Send + Sync {
    /// Check if the store is usable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Store a normalized dataset.
    ///
    /// # Returns
    /// * `Ok(DatasetInfo)` - Listing of the stored dataset. When a dataset
    ///   with the same checksum already exists, its info is returned and
    ///   nothing new is stored.
    /// * `Err(RepositoryError::ValidationError)` - If `rows` is empty
    ///
    /// `dropped_rows` is the number of raw rows normalization rejected; it is
    /// only reported back in listings.
    async fn store_dataset(
        &self,
        name: &str,
        rows: Vec<NormalizedRecord>,
        lookup: CodeLookup,
        catalog: FieldCatalog,
        checksum: String,
        dropped_rows: usize,
    ) -> RepositoryResult<DatasetInfo>;

    /// Retrieve a dataset snapshot by ID.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the dataset doesn't exist
    async fn get_dataset(&self, dataset_id: DatasetId) -> RepositoryResult<Arc<Dataset>>;

    /// List stored datasets ordered by ID.
    async fn list_datasets(&self) -> RepositoryResult<Vec<DatasetInfo>>;

    /// Remove a dataset, returning its last listing.
    async fn delete_dataset(&self, dataset_id: DatasetId) -> RepositoryResult<DatasetInfo>;
}
