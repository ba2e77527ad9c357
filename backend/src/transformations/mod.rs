//! Row cleaning and scope filtering.
//!
//! # Modules
//!
//! - [`normalize`]: validate raw rows and drop the ones that cannot be plotted
//! - [`filtering`]: narrow normalized rows by model, cluster and state
//!
//! # Example
//!
//! ```
//! use segment_insights::transformations::{filter_by_cluster, filter_by_models, normalize};
//! use serde_json::json;
//!
//! let raw = vec![
//!     json!({"model": "A", "cluster": 1, "emb_x": 0.5, "emb_y": 1.0}),
//!     json!({"model": "", "cluster": 2, "emb_x": 0.1, "emb_y": 0.2}),
//! ];
//! let rows = normalize(raw.into_iter().filter_map(|v| v.as_object().cloned()).collect());
//! assert_eq!(rows.len(), 1);
//!
//! let by_model = filter_by_models(&rows, &["A".to_string()]);
//! let scoped = filter_by_cluster(by_model, Some(1));
//! assert_eq!(scoped.len(), 1);
//! ```

pub mod filtering;
pub mod normalize;

pub use filtering::{filter_by_cluster, filter_by_models, filter_by_state, ScopeFilters};
pub use normalize::{normalize, normalize_record, normalize_with_report, NormalizeReport, MODEL_ALIASES};
