//! In-memory local repository implementation.
//!
//! All datasets live in a `HashMap` behind a single `RwLock`. Readers clone
//! the `Arc<Dataset>` out of the map and release the lock before any
//! aggregation runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::db::models::{Dataset, DatasetInfo};
use crate::db::repository::{DatasetRepository, ErrorContext, RepositoryError, RepositoryResult};
use crate::models::{CodeLookup, DatasetId, FieldCatalog, NormalizedRecord};

/// In-memory local repository.
///
/// # Example
/// ```
/// use segment_insights::db::{DatasetRepository, LocalRepository};
///
/// # tokio_test_block(async {
/// let repo = LocalRepository::new();
/// assert!(repo.list_datasets().await.unwrap().is_empty());
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
/// # }
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    datasets: HashMap<DatasetId, Arc<Dataset>>,
    by_checksum: HashMap<String, DatasetId>,
    next_dataset_id: DatasetId,
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            datasets: HashMap::new(),
            by_checksum: HashMap::new(),
            next_dataset_id: DatasetId(1),
            is_healthy: true,
        }
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    /// Get the number of datasets stored.
    pub fn dataset_count(&self) -> usize {
        self.data.read().datasets.len()
    }

    fn not_found(operation: &str, dataset_id: DatasetId) -> RepositoryError {
        RepositoryError::not_found_with_context(
            format!("Dataset {} not found", dataset_id),
            ErrorContext::new(operation)
                .with_entity("dataset")
                .with_entity_id(dataset_id),
        )
    }

    fn ensure_healthy(&self, operation: &str) -> RepositoryResult<()> {
        if self.data.read().is_healthy {
            Ok(())
        } else {
            Err(RepositoryError::connection("Local repository marked unhealthy")
                .with_operation(operation))
        }
    }
}

#[async_trait]
impl DatasetRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn store_dataset(
        &self,
        name: &str,
        rows: Vec<NormalizedRecord>,
        lookup: CodeLookup,
        catalog: FieldCatalog,
        checksum: String,
        dropped_rows: usize,
    ) -> RepositoryResult<DatasetInfo> {
        self.ensure_healthy("store_dataset")?;
        if rows.is_empty() {
            return Err(RepositoryError::validation_with_context(
                "Dataset has no valid rows",
                ErrorContext::new("store_dataset")
                    .with_entity("dataset")
                    .with_details(format!("name={}", name)),
            ));
        }

        let mut data = self.data.write();
        if let Some(existing) = data
            .by_checksum
            .get(&checksum)
            .and_then(|id| data.datasets.get(id))
        {
            log::info!(
                "Dataset '{}' matches stored dataset {} by checksum; reusing it",
                name,
                existing.id
            );
            return Ok(existing.info());
        }

        let dataset_id = data.next_dataset_id;
        data.next_dataset_id = DatasetId(dataset_id.0 + 1);

        let dataset = Dataset::new(dataset_id, name, rows, lookup, catalog, checksum.clone())
            .with_dropped_rows(dropped_rows);
        let info = dataset.info();
        data.by_checksum.insert(checksum, dataset_id);
        data.datasets.insert(dataset_id, Arc::new(dataset));

        log::info!(
            "Stored dataset {} ('{}') with {} rows",
            dataset_id,
            name,
            info.row_count
        );
        Ok(info)
    }

    async fn get_dataset(&self, dataset_id: DatasetId) -> RepositoryResult<Arc<Dataset>> {
        self.ensure_healthy("get_dataset")?;
        self.data
            .read()
            .datasets
            .get(&dataset_id)
            .cloned()
            .ok_or_else(|| Self::not_found("get_dataset", dataset_id))
    }

    async fn list_datasets(&self) -> RepositoryResult<Vec<DatasetInfo>> {
        self.ensure_healthy("list_datasets")?;
        let data = self.data.read();
        let mut infos: Vec<DatasetInfo> = data.datasets.values().map(|d| d.info()).collect();
        infos.sort_by_key(|info| info.dataset_id);
        Ok(infos)
    }

    async fn delete_dataset(&self, dataset_id: DatasetId) -> RepositoryResult<DatasetInfo> {
        self.ensure_healthy("delete_dataset")?;
        let mut data = self.data.write();
        let removed = data
            .datasets
            .remove(&dataset_id)
            .ok_or_else(|| Self::not_found("delete_dataset", dataset_id))?;
        data.by_checksum.remove(&removed.checksum);
        log::info!("Deleted dataset {}", dataset_id);
        Ok(removed.info())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(models: &[&str]) -> Vec<NormalizedRecord> {
        models
            .iter()
            .enumerate()
            .map(|(i, m)| NormalizedRecord {
                model: m.to_string(),
                cluster: i as i64,
                emb_x: 0.0,
                emb_y: 0.0,
                fields: json!({}).as_object().cloned().unwrap_or_default(),
            })
            .collect()
    }

    async fn store(repo: &LocalRepository, name: &str, checksum: &str) -> DatasetInfo {
        repo.store_dataset(
            name,
            rows(&["B", "A", "B"]),
            CodeLookup::new(),
            FieldCatalog::default(),
            checksum.to_string(),
            0,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_store_and_get() {
        let repo = LocalRepository::new();
        let info = store(&repo, "survey", "c1").await;
        assert_eq!(info.dataset_id, DatasetId(1));
        assert_eq!(info.row_count, 3);
        assert_eq!(info.models, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(info.clusters, vec![0, 1, 2]);

        let dataset = repo.get_dataset(info.dataset_id).await.unwrap();
        assert_eq!(dataset.name, "survey");
        assert_eq!(dataset.rows.len(), 3);
    }

    #[tokio::test]
    async fn test_checksum_dedup() {
        let repo = LocalRepository::new();
        let first = store(&repo, "one", "same").await;
        let second = store(&repo, "two", "same").await;
        assert_eq!(first.dataset_id, second.dataset_id);
        assert_eq!(second.name, "one");
        assert_eq!(repo.dataset_count(), 1);

        let third = store(&repo, "three", "other").await;
        assert_eq!(third.dataset_id, DatasetId(2));
    }

    #[tokio::test]
    async fn test_empty_rows_rejected() {
        let repo = LocalRepository::new();
        let err = repo
            .store_dataset(
                "empty",
                Vec::new(),
                CodeLookup::new(),
                FieldCatalog::default(),
                "x".into(),
                2,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
        assert_eq!(repo.dataset_count(), 0);
    }

    #[tokio::test]
    async fn test_not_found_carries_context() {
        let repo = LocalRepository::new();
        let err = repo.get_dataset(DatasetId(42)).await.unwrap_err();
        match &err {
            RepositoryError::NotFound { context, .. } => {
                assert_eq!(context.operation.as_deref(), Some("get_dataset"));
                assert_eq!(context.entity_id.as_deref(), Some("42"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_keeps_outstanding_snapshots() {
        let repo = LocalRepository::new();
        let info = store(&repo, "survey", "c1").await;
        let snapshot = repo.get_dataset(info.dataset_id).await.unwrap();

        repo.delete_dataset(info.dataset_id).await.unwrap();
        assert!(repo.get_dataset(info.dataset_id).await.is_err());
        assert!(repo.delete_dataset(info.dataset_id).await.is_err());
        assert_eq!(snapshot.rows.len(), 3);

        // The checksum is free again once deleted.
        let again = store(&repo, "survey", "c1").await;
        assert_eq!(again.dataset_id, DatasetId(2));
    }

    #[tokio::test]
    async fn test_unhealthy_repository() {
        let repo = LocalRepository::new();
        repo.set_healthy(false);
        assert!(!repo.health_check().await.unwrap());
        let err = repo.list_datasets().await.unwrap_err();
        assert!(err.is_retryable());
        repo.set_healthy(true);
        repo.clear();
        assert!(repo.list_datasets().await.unwrap().is_empty());
    }
}
