//! Per-field breakdowns for the segment panels.
//!
//! A field is summarized either as a numeric average (financing amounts) or
//! as a percentage distribution over its labels. Missing values are never
//! imputed: numeric sections report them as `missing_count`, categorical
//! sections fold them into a synthetic "Unknown" item.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::value::coerce_currency;
use crate::models::{CodeLookup, FieldCatalog, NormalizedRecord};

/// Label used for rows with no value in a categorical field.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Decides which fields are averaged rather than broken down by label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericPolicy {
    /// Exact field names or `PREFIX*` patterns treated as numeric.
    pub numeric_fields: Vec<String>,
    /// Fields matched above that must still be shown as categories.
    pub categorical_overrides: HashSet<String>,
}

impl Default for NumericPolicy {
    fn default() -> Self {
        Self::financing()
    }
}

impl NumericPolicy {
    pub fn new(numeric_fields: Vec<String>, categorical_overrides: HashSet<String>) -> Self {
        Self {
            numeric_fields,
            categorical_overrides,
        }
    }

    /// Financing amounts are numeric; coded financing answers stay categorical.
    pub fn financing() -> Self {
        let overrides = [
            "FIN_PURCHASE_TYPE",
            "FIN_PAYMENT_METHOD",
            "FIN_LENDER_TYPE",
            "FIN_LEASE_OR_BUY",
            "FIN_LOAN_TERM",
        ];
        Self {
            numeric_fields: vec!["FIN_*".to_string()],
            categorical_overrides: overrides.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn is_numeric(&self, field: &str) -> bool {
        if self.categorical_overrides.contains(field) {
            return false;
        }
        self.numeric_fields
            .iter()
            .any(|pattern| match pattern.strip_suffix('*') {
                Some(prefix) => field.starts_with(prefix),
                None => pattern == field,
            })
    }
}

/// One label of a categorical breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryItem {
    pub label: String,
    pub count: usize,
    pub pct: f64,
}

/// Summary of one field over a scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SummarySection {
    Numeric {
        average: f64,
        valid_count: usize,
        missing_count: usize,
    },
    Categorical {
        items: Vec<SummaryItem>,
        total: usize,
    },
}

impl SummarySection {
    pub fn is_numeric(&self) -> bool {
        matches!(self, SummarySection::Numeric { .. })
    }

    /// Rows that contributed to the section, missing ones included.
    pub fn total(&self) -> usize {
        match self {
            SummarySection::Numeric {
                valid_count,
                missing_count,
                ..
            } => valid_count + missing_count,
            SummarySection::Categorical { total, .. } => *total,
        }
    }
}

/// A section tagged with its field and display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub field: String,
    pub display_name: String,
    pub section: SummarySection,
}

fn numeric_section(rows: &[&NormalizedRecord], field: &str) -> Option<SummarySection> {
    let mut sum = 0.0;
    let mut valid_count = 0usize;
    let mut missing_count = 0usize;
    for row in rows {
        match row.get(field).and_then(coerce_currency) {
            Some(v) => {
                sum += v;
                valid_count += 1;
            }
            None => missing_count += 1,
        }
    }
    if valid_count == 0 {
        return None;
    }
    Some(SummarySection::Numeric {
        average: sum / valid_count as f64,
        valid_count,
        missing_count,
    })
}

/// Force the percentages to sum to 100 by letting the last item absorb drift.
fn absorb_rounding_drift(items: &mut [SummaryItem]) {
    if let Some((last, rest)) = items.split_last_mut() {
        let others: f64 = rest.iter().map(|i| i.pct).sum();
        last.pct = 100.0 - others;
    }
}

fn categorical_section(
    rows: &[&NormalizedRecord],
    field: &str,
    lookup: &CodeLookup,
) -> Option<SummarySection> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut missing_count = 0usize;
    for row in rows {
        match row.present(field) {
            Some(raw) => *counts.entry(lookup.label_for(field, raw)).or_insert(0) += 1,
            None => missing_count += 1,
        }
    }

    let valid_count: usize = counts.values().sum();
    let total = valid_count + missing_count;
    if total == 0 {
        return None;
    }
    if missing_count > 0 {
        *counts.entry(UNKNOWN_LABEL.to_string()).or_insert(0) += missing_count;
    }

    let mut items: Vec<SummaryItem> = counts
        .into_iter()
        .map(|(label, count)| SummaryItem {
            pct: count as f64 / total as f64 * 100.0,
            label,
            count,
        })
        .collect();
    items.sort_by(|a, b| match b.count.cmp(&a.count) {
        Ordering::Equal => a.label.cmp(&b.label),
        other => other,
    });
    absorb_rounding_drift(&mut items);

    Some(SummarySection::Categorical { items, total })
}

/// Summarize one field over a scope.
///
/// Numeric-policy fields are averaged over coercible values; when none is
/// coercible the field falls through to the categorical breakdown. Returns
/// `None` when the scope is empty, so empty sections are never emitted.
pub fn summarize_field(
    rows: &[&NormalizedRecord],
    field: &str,
    lookup: &CodeLookup,
    policy: &NumericPolicy,
) -> Option<SummarySection> {
    if policy.is_numeric(field) {
        if let Some(section) = numeric_section(rows, field) {
            return Some(section);
        }
    }
    categorical_section(rows, field, lookup)
}

/// Summarize several fields, skipping the ones without data.
pub fn summarize_fields(
    rows: &[&NormalizedRecord],
    fields: &[String],
    lookup: &CodeLookup,
    catalog: &FieldCatalog,
    policy: &NumericPolicy,
) -> Vec<FieldSummary> {
    fields
        .iter()
        .filter_map(|field| {
            summarize_field(rows, field, lookup, policy).map(|section| FieldSummary {
                field: field.clone(),
                display_name: catalog.display_name(field).to_string(),
                section,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReferenceEntry;
    use serde_json::{json, Value};

    fn row(fields: Value) -> NormalizedRecord {
        NormalizedRecord {
            model: "A".into(),
            cluster: 1,
            emb_x: 0.0,
            emb_y: 0.0,
            fields: fields.as_object().cloned().unwrap_or_default(),
        }
    }

    fn refs(rows: &[NormalizedRecord]) -> Vec<&NormalizedRecord> {
        rows.iter().collect()
    }

    fn pct_sum(section: &SummarySection) -> f64 {
        match section {
            SummarySection::Categorical { items, .. } => items.iter().map(|i| i.pct).sum(),
            _ => panic!("expected categorical section"),
        }
    }

    #[test]
    fn test_numeric_policy() {
        let policy = NumericPolicy::financing();
        assert!(policy.is_numeric("FIN_MONTHLY_PAYMENT"));
        assert!(!policy.is_numeric("FIN_LOAN_TERM"));
        assert!(!policy.is_numeric("AGE"));

        let exact = NumericPolicy::new(vec!["INCOME".into()], HashSet::new());
        assert!(exact.is_numeric("INCOME"));
        assert!(!exact.is_numeric("INCOME_BAND"));
    }

    #[test]
    fn test_numeric_average_excludes_missing() {
        let rows = vec![
            row(json!({"FIN_DOWN_PAYMENT": "$1,000"})),
            row(json!({"FIN_DOWN_PAYMENT": 3000})),
            row(json!({"FIN_DOWN_PAYMENT": "n/a"})),
            row(json!({})),
        ];
        let section = summarize_field(
            &refs(&rows),
            "FIN_DOWN_PAYMENT",
            &CodeLookup::new(),
            &NumericPolicy::financing(),
        )
        .unwrap();
        assert_eq!(
            section,
            SummarySection::Numeric {
                average: 2000.0,
                valid_count: 2,
                missing_count: 2
            }
        );
    }

    #[test]
    fn test_numeric_field_without_numbers_falls_back_to_categories() {
        let rows = vec![
            row(json!({"FIN_APR": "low"})),
            row(json!({"FIN_APR": "high"})),
        ];
        let section = summarize_field(
            &refs(&rows),
            "FIN_APR",
            &CodeLookup::new(),
            &NumericPolicy::financing(),
        )
        .unwrap();
        assert!(!section.is_numeric());
        assert_eq!(section.total(), 2);
    }

    #[test]
    fn test_categorical_with_unknown_and_lookup() {
        let lookup = CodeLookup::from_entries(vec![ReferenceEntry {
            name: "SEX".into(),
            start: json!(1),
            label: "Male".into(),
        }]);
        let rows = vec![
            row(json!({"SEX": 1})),
            row(json!({"SEX": "1"})),
            row(json!({"SEX": "F"})),
            row(json!({"SEX": ""})),
        ];
        let section =
            summarize_field(&refs(&rows), "SEX", &lookup, &NumericPolicy::financing()).unwrap();
        match &section {
            SummarySection::Categorical { items, total } => {
                assert_eq!(*total, 4);
                assert_eq!(items[0].label, "Male");
                assert_eq!(items[0].count, 2);
                assert_eq!(items[0].pct, 50.0);
                // Ties sort by label.
                assert_eq!(items[1].label, "F");
                assert_eq!(items[2].label, UNKNOWN_LABEL);
                assert_eq!(items[2].count, 1);
            }
            _ => panic!("expected categorical section"),
        }
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        let rows = vec![
            row(json!({"COLOR": "red"})),
            row(json!({"COLOR": "green"})),
            row(json!({"COLOR": "blue"})),
        ];
        let section = summarize_field(
            &refs(&rows),
            "COLOR",
            &CodeLookup::new(),
            &NumericPolicy::financing(),
        )
        .unwrap();
        assert!((pct_sum(&section) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_scope_is_skipped() {
        let section =
            summarize_field(&[], "AGE", &CodeLookup::new(), &NumericPolicy::financing());
        assert!(section.is_none());
    }

    #[test]
    fn test_all_missing_yields_only_unknown() {
        let rows = vec![row(json!({})), row(json!({"AGE": null}))];
        let section = summarize_field(
            &refs(&rows),
            "AGE",
            &CodeLookup::new(),
            &NumericPolicy::financing(),
        )
        .unwrap();
        match section {
            SummarySection::Categorical { items, total } => {
                assert_eq!(total, 2);
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].label, UNKNOWN_LABEL);
                assert_eq!(items[0].pct, 100.0);
            }
            _ => panic!("expected categorical section"),
        }
    }

    #[test]
    fn test_summarize_fields_uses_catalog_names() {
        let rows = vec![row(json!({"AGE": "25-34"}))];
        let mut names = HashMap::new();
        names.insert("AGE".to_string(), "Age".to_string());
        let catalog = FieldCatalog::new(names);
        let summaries = summarize_fields(
            &refs(&rows),
            &["AGE".to_string(), "SEX".to_string()],
            &CodeLookup::new(),
            &catalog,
            &NumericPolicy::financing(),
        );
        // SEX has rows (all missing) so it is still emitted as Unknown.
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].display_name, "Age");
        assert_eq!(summaries[1].display_name, "SEX");
    }
}
