//! Data Transfer Objects for the HTTP API.
//!
//! Engine outputs already derive `Serialize`, so most responses wrap them
//! directly and are re-exported here.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use crate::db::models::DatasetInfo;
pub use crate::services::geography::StateAggregate;
pub use crate::services::market::{DerivedKpis, KpiMetric, MarketState};
pub use crate::services::price_buckets::PriceHistogram;
pub use crate::services::segment_view::{SegmentView, SegmentViewRequest};
pub use crate::services::summary::FieldSummary;

use crate::db::services::DatasetUpload;
use crate::models::{FieldCatalog, ReferenceEntry};
use crate::services::price_buckets::DEFAULT_PRICE_FIELD;
use crate::transformations::ScopeFilters;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub repository: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetListResponse {
    pub datasets: Vec<DatasetInfo>,
    pub total: usize,
}

/// Request body for uploading a dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDatasetRequest {
    pub name: String,
    /// Survey rows; entries that are not objects are skipped.
    pub rows: Vec<Value>,
    #[serde(default)]
    pub reference: Vec<ReferenceEntry>,
    /// Field code to display name.
    #[serde(default)]
    pub catalog: HashMap<String, String>,
    /// Named field groups, e.g. the fields of one breakdown panel.
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<String>>,
}

impl From<CreateDatasetRequest> for DatasetUpload {
    fn from(request: CreateDatasetRequest) -> Self {
        let mut catalog = FieldCatalog::new(request.catalog);
        catalog.groups = request.groups;
        DatasetUpload {
            name: request.name,
            rows: request
                .rows
                .into_iter()
                .filter_map(|v| match v {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect(),
            reference: request.reference,
            catalog,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummariesRequest {
    #[serde(default)]
    pub filters: ScopeFilters,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub field_group: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummariesResponse {
    pub scope_size: usize,
    pub sections: Vec<FieldSummary>,
}

fn default_price_field() -> String {
    DEFAULT_PRICE_FIELD.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceHistogramRequest {
    #[serde(default)]
    pub filters: ScopeFilters,
    #[serde(default = "default_price_field")]
    pub price_field: String,
    /// Also return one histogram per cluster of the scope.
    #[serde(default)]
    pub by_cluster: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceHistogramResponse {
    pub scope_size: usize,
    pub histogram: PriceHistogram,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_cluster: Option<BTreeMap<i64, PriceHistogram>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateMapRequest {
    /// The state selection, if any, is ignored: the map never narrows itself.
    #[serde(default)]
    pub filters: ScopeFilters,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateMapResponse {
    pub scope_size: usize,
    #[serde(flatten)]
    pub aggregate: StateAggregate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDeriveResponse {
    /// The state after clamping.
    pub state: MarketState,
    pub kpis: DerivedKpis,
    pub profit_maximizing_price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSolveRequest {
    pub metric: KpiMetric,
    pub target: f64,
    #[serde(default)]
    pub state: MarketState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSolveResponse {
    pub state: MarketState,
    pub kpis: DerivedKpis,
    /// Value of the edited KPI at the solved price.
    pub achieved: f64,
}
