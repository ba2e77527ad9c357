//! One-shot computation of every coupled dashboard panel.
//!
//! The panels deliberately look at different scopes of the same dataset:
//!
//! | panel                         | scope                          |
//! |-------------------------------|--------------------------------|
//! | scatter, cluster profiles     | model filter                   |
//! | state map                     | model + cluster                |
//! | breakdowns, histogram, agrees | model + cluster + state        |
//!
//! Selecting a state therefore never narrows the map it was picked from, and
//! a locked panel always shows the full population.

use serde::{Deserialize, Serialize};

use crate::db::Dataset;
use crate::models::NormalizedRecord;
use crate::transformations::ScopeFilters;

use super::attitude::{attitude_scores, AttitudeScore, DenominatorMode};
use super::clusters::{cluster_profiles, scatter_points, ClusterProfile, ScatterPoint};
use super::geography::{aggregate_by_state, StateAggregate, StateResolver};
use super::price_buckets::{bucketize, PriceHistogram, DEFAULT_PRICE_FIELD};
use super::summary::{summarize_fields, FieldSummary, NumericPolicy};

fn default_price_field() -> String {
    DEFAULT_PRICE_FIELD.to_string()
}

/// Panels that can be pinned to the full population.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelLocks {
    pub scatter: bool,
    pub map: bool,
    pub breakdowns: bool,
    pub histogram: bool,
    pub attitudes: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentViewRequest {
    #[serde(default)]
    pub filters: ScopeFilters,
    /// Fields to break down. When empty, `field_group` is expanded instead.
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub field_group: Option<String>,
    #[serde(default)]
    pub attitude_fields: Vec<String>,
    #[serde(default = "default_price_field")]
    pub price_field: String,
    #[serde(default)]
    pub locks: PanelLocks,
    #[serde(default)]
    pub denominator: DenominatorMode,
}

impl Default for SegmentViewRequest {
    fn default() -> Self {
        Self {
            filters: ScopeFilters::default(),
            fields: Vec::new(),
            field_group: None,
            attitude_fields: Vec::new(),
            price_field: default_price_field(),
            locks: PanelLocks::default(),
            denominator: DenominatorMode::default(),
        }
    }
}

/// Number of rows each panel was computed over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSizes {
    pub population: usize,
    pub scatter: usize,
    pub map: usize,
    pub breakdowns: usize,
    pub histogram: usize,
    pub attitudes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentView {
    pub scatter: Vec<ScatterPoint>,
    pub clusters: Vec<ClusterProfile>,
    pub state_map: StateAggregate,
    pub sections: Vec<FieldSummary>,
    pub price_histogram: PriceHistogram,
    pub attitudes: Vec<AttitudeScore>,
    pub scope_sizes: ScopeSizes,
}

/// Holds the injected tables used while building views.
#[derive(Debug, Clone, Default)]
pub struct SegmentViewBuilder {
    pub resolver: StateResolver,
    pub policy: NumericPolicy,
}

impl SegmentViewBuilder {
    pub fn new(resolver: StateResolver, policy: NumericPolicy) -> Self {
        Self { resolver, policy }
    }

    pub fn build(&self, dataset: &Dataset, request: &SegmentViewRequest) -> SegmentView {
        let rows = dataset.rows.as_slice();
        let matcher = self.resolver.matcher(&dataset.lookup);
        let locks = request.locks;
        let panel = |locked: bool| {
            let filters = request.filters.clone();
            let locked = filters.locked || locked;
            filters.with_lock(locked)
        };

        let scatter_scope = panel(locks.scatter).baseline(rows);
        let map_scope = panel(locks.map).without_state(rows);
        let breakdown_scope = panel(locks.breakdowns).apply(rows, &matcher);
        let histogram_scope = panel(locks.histogram).apply(rows, &matcher);
        let attitude_scope = panel(locks.attitudes).apply(rows, &matcher);

        let fields = resolve_fields(dataset, &request.fields, request.field_group.as_deref());

        SegmentView {
            scatter: scatter_points(&scatter_scope),
            clusters: cluster_profiles(&scatter_scope),
            state_map: aggregate_by_state(map_scope.iter().copied(), &matcher),
            sections: summarize_fields(
                &breakdown_scope,
                &fields,
                &dataset.lookup,
                &dataset.catalog,
                &self.policy,
            ),
            price_histogram: bucketize(histogram_scope.iter().copied(), &request.price_field),
            attitudes: attitude_scores(
                &attitude_scope,
                &request.attitude_fields,
                &dataset.lookup,
                request.denominator,
            ),
            scope_sizes: ScopeSizes {
                population: rows.len(),
                scatter: scatter_scope.len(),
                map: map_scope.len(),
                breakdowns: breakdown_scope.len(),
                histogram: histogram_scope.len(),
                attitudes: attitude_scope.len(),
            },
        }
    }

    /// Full filter scope (models, cluster, state) of a dataset.
    pub fn scope<'d>(&self, dataset: &'d Dataset, filters: &ScopeFilters) -> Vec<&'d NormalizedRecord> {
        let matcher = self.resolver.matcher(&dataset.lookup);
        filters.apply(&dataset.rows, &matcher)
    }
}

/// Explicit fields win; otherwise the named catalog group, if any.
pub(crate) fn resolve_fields(
    dataset: &Dataset,
    fields: &[String],
    field_group: Option<&str>,
) -> Vec<String> {
    if !fields.is_empty() {
        return fields.to_vec();
    }
    field_group
        .and_then(|group| dataset.catalog.group(group))
        .map(<[String]>::to_vec)
        .unwrap_or_default()
}

/// Build a view with the default US state table and financing policy.
pub fn build_segment_view(dataset: &Dataset, request: &SegmentViewRequest) -> SegmentView {
    SegmentViewBuilder::default().build(dataset, request)
}
