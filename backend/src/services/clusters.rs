//! Cluster-level rollups for the embedding scatter plot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::value::coerce_currency;
use crate::models::NormalizedRecord;

use super::summary::NumericPolicy;

/// Size and embedding centroid of one cluster within a scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterProfile {
    pub cluster: i64,
    pub count: usize,
    pub pct: f64,
    pub centroid_x: f64,
    pub centroid_y: f64,
}

/// A row as drawn on the scatter plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub model: String,
    pub cluster: i64,
    pub x: f64,
    pub y: f64,
}

pub fn scatter_points(rows: &[&NormalizedRecord]) -> Vec<ScatterPoint> {
    rows.iter()
        .map(|r| ScatterPoint {
            model: r.model.clone(),
            cluster: r.cluster,
            x: r.emb_x,
            y: r.emb_y,
        })
        .collect()
}

/// One profile per cluster, ordered by cluster id.
pub fn cluster_profiles(rows: &[&NormalizedRecord]) -> Vec<ClusterProfile> {
    let total = rows.len();
    let mut sums: BTreeMap<i64, (usize, f64, f64)> = BTreeMap::new();
    for row in rows {
        let entry = sums.entry(row.cluster).or_insert((0, 0.0, 0.0));
        entry.0 += 1;
        entry.1 += row.emb_x;
        entry.2 += row.emb_y;
    }
    sums.into_iter()
        .map(|(cluster, (count, sx, sy))| ClusterProfile {
            cluster,
            count,
            pct: count as f64 / total as f64 * 100.0,
            centroid_x: sx / count as f64,
            centroid_y: sy / count as f64,
        })
        .collect()
}

/// Count-weighted average of per-cluster averages of a numeric field.
///
/// Each cluster contributes its mean over coercible values, weighted by the
/// number of scope rows in that cluster, so a cluster with sparse answers
/// still counts at its full size. Clusters without any coercible value are
/// skipped. Fields outside the numeric policy, or a scope without any
/// coercible value, yield NaN.
pub fn weighted_cluster_average(
    rows: &[&NormalizedRecord],
    field: &str,
    policy: &NumericPolicy,
) -> f64 {
    if !policy.is_numeric(field) {
        return f64::NAN;
    }
    // cluster -> (sum of values, coercible values, scope rows)
    let mut per_cluster: BTreeMap<i64, (f64, usize, usize)> = BTreeMap::new();
    for row in rows {
        let entry = per_cluster.entry(row.cluster).or_insert((0.0, 0, 0));
        entry.2 += 1;
        if let Some(v) = row.get(field).and_then(coerce_currency) {
            entry.0 += v;
            entry.1 += 1;
        }
    }

    let (weighted, weight) = per_cluster
        .values()
        .filter(|(_, valid, _)| *valid > 0)
        .fold((0.0, 0usize), |(acc, w), (sum, valid, size)| {
            let mean = sum / *valid as f64;
            (acc + mean * *size as f64, w + size)
        });
    if weight == 0 {
        return f64::NAN;
    }
    weighted / weight as f64
}
