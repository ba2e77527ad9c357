//! "Percent agree" scoring for attitudinal survey fields.
//!
//! Which answers count as agreement depends on the field naming convention:
//! the loyalty group field only counts "loyal", `STATE_*` statements count
//! the top two boxes, and everything else counts the top three.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::value::display_string;
use crate::models::{CodeLookup, NormalizedRecord};

/// Loyalty group field scored with [`AgreePolicy::LoyalOnly`].
pub const LOYALTY_FIELD: &str = "OL_MODEL_GRP";

/// Suffixes probed, in order, when the field itself has no value.
pub const LABEL_SUFFIXES: &[&str] = &["_LABEL", "_TXT", "_TEXT", "_DESC", "_LAB"];

const TOP_TWO: &[&str] = &["strongly agree", "somewhat agree"];
const TOP_THREE: &[&str] = &["strongly agree", "somewhat agree", "agree"];

/// Agreement set applied to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgreePolicy {
    LoyalOnly,
    TopTwo,
    TopThree,
}

impl AgreePolicy {
    pub fn for_field(field: &str) -> Self {
        if field == LOYALTY_FIELD {
            AgreePolicy::LoyalOnly
        } else if field
            .get(..6)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("STATE_"))
        {
            AgreePolicy::TopTwo
        } else {
            AgreePolicy::TopThree
        }
    }

    /// Whether a normalized label counts as agreement.
    pub fn agrees(&self, normalized: &str) -> bool {
        match self {
            AgreePolicy::LoyalOnly => normalized == "loyal",
            AgreePolicy::TopTwo => TOP_TWO.contains(&normalized),
            AgreePolicy::TopThree => TOP_THREE.contains(&normalized),
        }
    }
}

/// Denominator used for the percentage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenominatorMode {
    /// agree / (valid + missing)
    #[default]
    IncludeMissing,
    /// agree / valid
    ExcludeMissing,
}

/// Trim, lowercase and collapse runs of whitespace.
pub fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Effective label of `field` for one row, or `None` when missing.
///
/// The direct value is resolved through the code lookup; the label aliases
/// already hold text and are used as-is.
pub fn effective_label(row: &NormalizedRecord, field: &str, lookup: &CodeLookup) -> Option<String> {
    if let Some(raw) = row.present(field) {
        return Some(lookup.label_for(field, raw));
    }
    LABEL_SUFFIXES.iter().find_map(|suffix| {
        row.present(&format!("{field}{suffix}"))
            .map(display_string)
    })
}

/// Agreement tally for one field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgreeTally {
    pub agree: usize,
    pub valid: usize,
    pub missing: usize,
}

impl AgreeTally {
    /// Share of agreement in percent, or NaN when the denominator is zero.
    pub fn percent(&self, mode: DenominatorMode) -> f64 {
        let denominator = match mode {
            DenominatorMode::IncludeMissing => self.valid + self.missing,
            DenominatorMode::ExcludeMissing => self.valid,
        };
        if denominator == 0 {
            return f64::NAN;
        }
        self.agree as f64 / denominator as f64 * 100.0
    }
}

pub fn tally_agreement<'r, I>(rows: I, field: &str, lookup: &CodeLookup) -> AgreeTally
where
    I: IntoIterator<Item = &'r NormalizedRecord>,
{
    let policy = AgreePolicy::for_field(field);
    let mut tally = AgreeTally::default();
    for row in rows {
        match effective_label(row, field, lookup) {
            Some(label) => {
                tally.valid += 1;
                if policy.agrees(&normalize_label(&label)) {
                    tally.agree += 1;
                }
            }
            None => tally.missing += 1,
        }
    }
    tally
}

/// Percent of rows agreeing with `field`, missing rows in the denominator.
///
/// NaN means "insufficient data" and must not be rendered as 0%.
pub fn percent_agree<'r, I>(rows: I, field: &str, lookup: &CodeLookup) -> f64
where
    I: IntoIterator<Item = &'r NormalizedRecord>,
{
    percent_agree_with(rows, field, lookup, DenominatorMode::IncludeMissing)
}

pub fn percent_agree_with<'r, I>(
    rows: I,
    field: &str,
    lookup: &CodeLookup,
    mode: DenominatorMode,
) -> f64
where
    I: IntoIterator<Item = &'r NormalizedRecord>,
{
    tally_agreement(rows, field, lookup).percent(mode)
}

/// Score of one attitude field over a scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttitudeScore {
    pub field: String,
    pub policy: AgreePolicy,
    /// `None` when there is no data (serialized as `null`).
    pub pct_agree: Option<f64>,
    pub respondents: usize,
}

/// Score several attitude fields over the same scope.
pub fn attitude_scores(
    rows: &[&NormalizedRecord],
    fields: &[String],
    lookup: &CodeLookup,
    mode: DenominatorMode,
) -> Vec<AttitudeScore> {
    fields
        .iter()
        .map(|field| {
            let tally = tally_agreement(rows.iter().copied(), field, lookup);
            let pct = tally.percent(mode);
            AttitudeScore {
                field: field.clone(),
                policy: AgreePolicy::for_field(field),
                pct_agree: (!pct.is_nan()).then_some(pct),
                respondents: tally.valid,
            }
        })
        .collect()
}

/// Percent agree per cluster, keyed by cluster id.
pub fn percent_agree_by_cluster(
    rows: &[&NormalizedRecord],
    field: &str,
    lookup: &CodeLookup,
    mode: DenominatorMode,
) -> BTreeMap<i64, f64> {
    let mut groups: BTreeMap<i64, Vec<&NormalizedRecord>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.cluster).or_default().push(*row);
    }
    groups
        .into_iter()
        .map(|(cluster, members)| {
            (
                cluster,
                percent_agree_with(members, field, lookup, mode),
            )
        })
        .collect()
}
