//! Fixed-edge price histogram.
//!
//! The edges never depend on the data, so histograms of different groups can
//! be compared bin by bin: one open "Under $30k" bin, sixteen $5k bins up to
//! $110k, and an open "$110k+" bin.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::value::coerce_currency;
use crate::models::NormalizedRecord;

/// Price field used by the segment view unless another one is requested.
pub const DEFAULT_PRICE_FIELD: &str = "FIN_PRICE_UNEDITED";

const FLOOR: f64 = 30_000.0;
const CEILING: f64 = 110_000.0;
const STEP: f64 = 5_000.0;

/// One histogram bin. `low` is inclusive, `high` exclusive; `None` is open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBucket {
    pub low: Option<f64>,
    pub high: Option<f64>,
    pub label: String,
    pub count: usize,
    pub pct: f64,
}

impl PriceBucket {
    fn empty(low: Option<f64>, high: Option<f64>) -> Self {
        Self {
            low,
            high,
            label: bucket_label(low, high),
            count: 0,
            pct: 0.0,
        }
    }

    pub fn contains(&self, price: f64) -> bool {
        self.low.map_or(true, |lo| price >= lo) && self.high.map_or(true, |hi| price < hi)
    }
}

/// Histogram over a scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceHistogram {
    /// Empty when no row had a usable price.
    pub bins: Vec<PriceBucket>,
    pub total_valid: usize,
}

/// `30000 -> "$30k"`, `34900 -> "$34.9k"`.
fn format_thousands(amount: f64) -> String {
    let k = amount / 1000.0;
    if (k - k.round()).abs() < 1e-9 {
        format!("${:.0}k", k)
    } else {
        format!("${:.1}k", k)
    }
}

/// Display label of a bin. The upper edge prints as `high - 100` so that a
/// $30,000-$35,000 bin reads "$30k to $34.9k".
pub fn bucket_label(low: Option<f64>, high: Option<f64>) -> String {
    match (low, high) {
        (None, Some(hi)) => format!("Under {}", format_thousands(hi)),
        (Some(lo), None) => format!("{}+", format_thousands(lo)),
        (Some(lo), Some(hi)) => format!(
            "{} to {}",
            format_thousands(lo),
            format_thousands(hi - 100.0)
        ),
        (None, None) => "All prices".to_string(),
    }
}

/// The static bin layout with zero counts.
pub fn bucket_edges() -> Vec<PriceBucket> {
    let steps = ((CEILING - FLOOR) / STEP).round() as usize;
    let mut bins = Vec::with_capacity(steps + 2);
    bins.push(PriceBucket::empty(None, Some(FLOOR)));
    for i in 0..steps {
        let low = FLOOR + i as f64 * STEP;
        bins.push(PriceBucket::empty(Some(low), Some(low + STEP)));
    }
    bins.push(PriceBucket::empty(Some(CEILING), None));
    bins
}

/// Index of the bin holding `price` in [`bucket_edges`].
pub fn bucket_index(price: f64) -> usize {
    if price < FLOOR {
        0
    } else if price >= CEILING {
        ((CEILING - FLOOR) / STEP).round() as usize + 1
    } else {
        ((price - FLOOR) / STEP).floor() as usize + 1
    }
}

/// Bucket the prices in `price_field` over a scope.
///
/// `$` and `,` are stripped before parsing; rows without a usable price are
/// left out of every bin and of `total_valid`.
pub fn bucketize<'r, I>(rows: I, price_field: &str) -> PriceHistogram
where
    I: IntoIterator<Item = &'r NormalizedRecord>,
{
    let mut bins = bucket_edges();
    let mut total_valid = 0usize;
    for price in rows
        .into_iter()
        .filter_map(|r| r.get(price_field).and_then(coerce_currency))
    {
        bins[bucket_index(price)].count += 1;
        total_valid += 1;
    }

    if total_valid == 0 {
        return PriceHistogram::default();
    }
    for bin in &mut bins {
        bin.pct = bin.count as f64 / total_valid as f64 * 100.0;
    }
    PriceHistogram { bins, total_valid }
}

/// One histogram per cluster over the same static edges.
pub fn bucketize_by_cluster(
    rows: &[&NormalizedRecord],
    price_field: &str,
) -> BTreeMap<i64, PriceHistogram> {
    let mut groups: BTreeMap<i64, Vec<&NormalizedRecord>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.cluster).or_default().push(*row);
    }
    groups
        .into_iter()
        .map(|(cluster, members)| (cluster, bucketize(members, price_field)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn row(cluster: i64, fields: Value) -> NormalizedRecord {
        NormalizedRecord {
            model: "A".into(),
            cluster,
            emb_x: 0.0,
            emb_y: 0.0,
            fields: fields.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn test_edges_are_static() {
        let edges = bucket_edges();
        assert_eq!(edges.len(), 18);
        assert_eq!(edges[0].label, "Under $30k");
        assert_eq!(edges[1].label, "$30k to $34.9k");
        assert_eq!(edges[2].label, "$35k to $39.9k");
        assert_eq!(edges[16].label, "$105k to $109.9k");
        assert_eq!(edges[17].label, "$110k+");
        assert_eq!(edges[16].high, Some(110_000.0));
    }

    #[test]
    fn test_bucket_index_boundaries() {
        assert_eq!(bucket_index(-5.0), 0);
        assert_eq!(bucket_index(29_999.99), 0);
        assert_eq!(bucket_index(30_000.0), 1);
        assert_eq!(bucket_index(34_999.0), 1);
        assert_eq!(bucket_index(35_000.0), 2);
        assert_eq!(bucket_index(109_999.0), 16);
        assert_eq!(bucket_index(110_000.0), 17);
        assert_eq!(bucket_index(1e9), 17);
        let edges = bucket_edges();
        for price in [0.0, 30_000.0, 72_500.0, 110_000.0] {
            assert!(edges[bucket_index(price)].contains(price));
        }
    }

    #[test]
    fn test_bucketize_currency_strings() {
        let rows = vec![
            row(1, json!({"FIN_PRICE_UNEDITED": "$29,999"})),
            row(1, json!({"FIN_PRICE_UNEDITED": "$35,200"})),
            row(1, json!({"FIN_PRICE_UNEDITED": "call me"})),
            row(1, json!({})),
        ];
        let hist = bucketize(&rows, DEFAULT_PRICE_FIELD);
        assert_eq!(hist.total_valid, 2);
        assert_eq!(hist.bins[0].count, 1);
        assert_eq!(hist.bins[0].pct, 50.0);
        assert_eq!(hist.bins[2].label, "$35k to $39.9k");
        assert_eq!(hist.bins[2].count, 1);
        assert_eq!(hist.bins[2].pct, 50.0);
        assert_eq!(hist.bins.iter().map(|b| b.count).sum::<usize>(), 2);
    }

    #[test]
    fn test_space_separated_price_is_not_valid() {
        let rows = vec![
            row(1, json!({"FIN_PRICE_UNEDITED": "35 200"})),
            row(1, json!({"FIN_PRICE_UNEDITED": " $36,000 "})),
        ];
        let hist = bucketize(&rows, DEFAULT_PRICE_FIELD);
        assert_eq!(hist.total_valid, 1);
        assert_eq!(hist.bins[2].count, 1);
        assert_eq!(hist.bins[2].pct, 100.0);
    }

    #[test]
    fn test_no_valid_prices_returns_empty_bins() {
        let rows = vec![row(1, json!({"FIN_PRICE_UNEDITED": ""}))];
        let hist = bucketize(&rows, DEFAULT_PRICE_FIELD);
        assert!(hist.bins.is_empty());
        assert_eq!(hist.total_valid, 0);
    }

    #[test]
    fn test_bucketize_by_cluster() {
        let rows = vec![
            row(1, json!({"P": 45_000})),
            row(2, json!({"P": 120_000})),
            row(2, json!({"P": 10_000})),
        ];
        let refs: Vec<&NormalizedRecord> = rows.iter().collect();
        let by_cluster = bucketize_by_cluster(&refs, "P");
        assert_eq!(by_cluster[&1].total_valid, 1);
        assert_eq!(by_cluster[&2].total_valid, 2);
        assert_eq!(by_cluster[&2].bins.len(), by_cluster[&1].bins.len());
        assert_eq!(by_cluster[&2].bins[17].count, 1);
    }
}
