//! High-level dataset service layer.
//!
//! Repository-agnostic operations holding the ingestion rules: checksums,
//! row normalization and reference table construction happen here, so every
//! repository implementation stores the same thing.
//!
//! # Usage
//!
//! ```no_run
//! use segment_insights::db::{services, LocalRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = LocalRepository::new();
//!     let datasets = services::list_datasets(&repo).await?;
//!     println!("Found {} datasets", datasets.len());
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use anyhow::Context;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::checksum::dataset_checksum;
use super::models::{Dataset, DatasetInfo};
use super::repository::{DatasetRepository, ErrorContext, RepositoryError, RepositoryResult};
use crate::config::DatasetSource;
use crate::io::loaders::{DatasetLoader, LoadError};
use crate::models::{CodeLookup, DatasetId, FieldCatalog, Record, ReferenceEntry};
use crate::transformations::normalize_with_report;

/// Raw inputs of a dataset before normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetUpload {
    pub name: String,
    pub rows: Vec<Record>,
    #[serde(default)]
    pub reference: Vec<ReferenceEntry>,
    #[serde(default)]
    pub catalog: FieldCatalog,
}

impl DatasetUpload {
    /// Read the files listed in a configured dataset source.
    pub fn from_source(source: &DatasetSource) -> Result<Self, LoadError> {
        let rows = DatasetLoader::load_records_file(&source.rows)?;
        let reference = match &source.reference {
            Some(path) => DatasetLoader::load_reference_file(path)?,
            None => Vec::new(),
        };
        let catalog = match &source.catalog {
            Some(path) => DatasetLoader::load_catalog_file(path)?,
            None => FieldCatalog::default(),
        };
        Ok(Self {
            name: source.name.clone(),
            rows,
            reference,
            catalog,
        })
    }
}

/// Check if the repository is healthy.
pub async fn health_check<R: DatasetRepository + ?Sized>(repo: &R) -> RepositoryResult<bool> {
    repo.health_check().await
}

/// Normalize and store an upload.
///
/// Malformed rows are dropped with a warning. An upload in which no row
/// survives normalization is rejected with a validation error.
pub async fn store_dataset<R: DatasetRepository + ?Sized>(
    repo: &R,
    upload: DatasetUpload,
) -> RepositoryResult<DatasetInfo> {
    let DatasetUpload {
        name,
        rows,
        reference,
        catalog,
    } = upload;

    if name.trim().is_empty() {
        return Err(RepositoryError::validation_with_context(
            "Dataset name must not be empty",
            ErrorContext::new("store_dataset").with_entity("dataset"),
        ));
    }

    let checksum = dataset_checksum(&rows, &reference);
    let total = rows.len();
    let report = normalize_with_report(rows);
    if report.rows.is_empty() {
        return Err(RepositoryError::validation_with_context(
            "Dataset has no valid rows",
            ErrorContext::new("store_dataset")
                .with_entity("dataset")
                .with_details(format!("name={}, dropped={} of {}", name, report.dropped, total)),
        ));
    }
    if report.dropped > 0 {
        warn!(
            "Dataset '{}': dropped {} of {} rows without model, cluster or embedding",
            name, report.dropped, total
        );
    }

    let lookup = CodeLookup::from_entries(reference);
    info!(
        "Storing dataset '{}' ({} rows, {} coded fields)",
        name,
        report.rows.len(),
        lookup.field_count()
    );
    repo.store_dataset(&name, report.rows, lookup, catalog, checksum, report.dropped)
        .await
}

/// Read a configured dataset from disk and store it.
pub async fn load_dataset_source<R: DatasetRepository + ?Sized>(
    repo: &R,
    source: &DatasetSource,
) -> anyhow::Result<DatasetInfo> {
    let upload = DatasetUpload::from_source(source)
        .with_context(|| format!("Failed to read dataset '{}'", source.name))?;
    let info = store_dataset(repo, upload)
        .await
        .with_context(|| format!("Failed to store dataset '{}'", source.name))?;
    Ok(info)
}

pub async fn get_dataset<R: DatasetRepository + ?Sized>(
    repo: &R,
    dataset_id: DatasetId,
) -> RepositoryResult<Arc<Dataset>> {
    repo.get_dataset(dataset_id).await
}

pub async fn list_datasets<R: DatasetRepository + ?Sized>(
    repo: &R,
) -> RepositoryResult<Vec<DatasetInfo>> {
    repo.list_datasets().await
}

pub async fn delete_dataset<R: DatasetRepository + ?Sized>(
    repo: &R,
    dataset_id: DatasetId,
) -> RepositoryResult<DatasetInfo> {
    repo.delete_dataset(dataset_id).await
}
