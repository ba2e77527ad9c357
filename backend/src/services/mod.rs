//! Service layer: the aggregation engine behind every dashboard panel.
//!
//! All functions here are synchronous and total. They take borrowed scopes of
//! normalized rows and recover from bad data locally (NaN, empty results or
//! `None`) instead of returning errors.

pub mod attitude;
pub mod clusters;
pub mod geography;
pub mod market;
pub mod price_buckets;
pub mod segment_view;
pub mod summary;

pub use attitude::{
    attitude_scores, percent_agree, percent_agree_by_cluster, percent_agree_with, AgreePolicy,
    AttitudeScore, DenominatorMode,
};
pub use clusters::{cluster_profiles, weighted_cluster_average, ClusterProfile, ScatterPoint};
pub use geography::{aggregate_by_state, resolve_state_name, StateAggregate, StateResolver};
pub use market::{
    apply_kpi_edit, derive_all, invert_elasticity_for_price, solve_for_margin, solve_for_profit,
    solve_for_revenue, solve_price, DerivedKpis, KpiMetric, MarketState,
};
pub use price_buckets::{bucketize, bucketize_by_cluster, PriceBucket, PriceHistogram};
pub use segment_view::{
    build_segment_view, PanelLocks, SegmentView, SegmentViewBuilder, SegmentViewRequest,
};
pub use summary::{summarize_field, summarize_fields, FieldSummary, NumericPolicy, SummarySection};
