//! Stored dataset snapshots and their lightweight listings.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{CodeLookup, DatasetId, FieldCatalog, NormalizedRecord};

/// A normalized dataset together with its reference tables.
///
/// Immutable once stored; handlers share it as `Arc<Dataset>`.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub id: DatasetId,
    pub name: String,
    pub checksum: String,
    pub rows: Vec<NormalizedRecord>,
    pub lookup: CodeLookup,
    pub catalog: FieldCatalog,
    /// Raw rows rejected by normalization.
    pub dropped_rows: usize,
    pub loaded_at: DateTime<Utc>,
}

impl Dataset {
    pub fn new(
        id: DatasetId,
        name: impl Into<String>,
        rows: Vec<NormalizedRecord>,
        lookup: CodeLookup,
        catalog: FieldCatalog,
        checksum: String,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            checksum,
            rows,
            lookup,
            catalog,
            dropped_rows: 0,
            loaded_at: Utc::now(),
        }
    }

    pub fn with_dropped_rows(mut self, dropped_rows: usize) -> Self {
        self.dropped_rows = dropped_rows;
        self
    }

    /// Distinct model names, sorted.
    pub fn models(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|r| r.model.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct cluster ids, sorted.
    pub fn clusters(&self) -> Vec<i64> {
        self.rows
            .iter()
            .map(|r| r.cluster)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn info(&self) -> DatasetInfo {
        DatasetInfo {
            dataset_id: self.id,
            name: self.name.clone(),
            checksum: self.checksum.clone(),
            row_count: self.rows.len(),
            dropped_rows: self.dropped_rows,
            models: self.models(),
            clusters: self.clusters(),
            loaded_at: self.loaded_at,
        }
    }
}

/// Listing entry for a stored dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub dataset_id: DatasetId,
    pub name: String,
    pub checksum: String,
    pub row_count: usize,
    #[serde(default)]
    pub dropped_rows: usize,
    pub models: Vec<String>,
    pub clusters: Vec<i64>,
    pub loaded_at: DateTime<Utc>,
}
