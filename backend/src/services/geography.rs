//! State resolution and per-state aggregation for the choropleth map.
//!
//! Rows carry their state under several naming variants, sometimes as a
//! survey code, sometimes as an abbreviation, sometimes embedded in free
//! text ("Austin, TX"). [`StateResolver`] tries an ordered list of candidate
//! keys and a fixed sequence of matchers; the first hit wins.

use std::collections::{BTreeMap, HashMap};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::value::display_string;
use crate::models::{CodeLookup, NormalizedRecord};

/// US state abbreviations and names, DC included.
pub const US_STATES: &[(&str, &str)] = &[
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("DC", "District of Columbia"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
];

/// Field keys that may hold a respondent's state, in priority order.
pub const STATE_CANDIDATE_KEYS: &[&str] = &[
    "STATE",
    "STATE_NAME",
    "state",
    "State",
    "state_name",
    "RES_STATE",
    "DEM_STATE",
];

/// The coded state field; its values go through the code lookup first.
pub const CANONICAL_STATE_FIELD: &str = "STATE";

/// Bidirectional abbreviation <-> name table.
#[derive(Debug, Clone)]
pub struct StateTable {
    by_abbreviation: HashMap<String, String>,
    by_lower_name: HashMap<String, String>,
}

impl StateTable {
    pub fn from_pairs<'s, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'s str, &'s str)>,
    {
        let mut by_abbreviation = HashMap::new();
        let mut by_lower_name = HashMap::new();
        for (abbr, name) in pairs {
            by_abbreviation.insert(abbr.to_ascii_uppercase(), name.to_string());
            by_lower_name.insert(name.to_lowercase(), name.to_string());
        }
        Self {
            by_abbreviation,
            by_lower_name,
        }
    }

    pub fn us() -> Self {
        Self::from_pairs(US_STATES.iter().copied())
    }

    /// Full name for an exact (case-insensitive) state name.
    pub fn name_match(&self, text: &str) -> Option<&str> {
        self.by_lower_name
            .get(&text.to_lowercase())
            .map(String::as_str)
    }

    /// Full name for a two-letter abbreviation.
    pub fn abbreviation_match(&self, text: &str) -> Option<&str> {
        if text.len() != 2 {
            return None;
        }
        self.by_abbreviation
            .get(&text.to_ascii_uppercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_abbreviation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_abbreviation.is_empty()
    }
}

/// Resolves a row to a full state name.
#[derive(Debug, Clone)]
pub struct StateResolver {
    table: StateTable,
    candidate_keys: Vec<String>,
    canonical_field: String,
    token: Regex,
}

impl Default for StateResolver {
    fn default() -> Self {
        Self::new(
            StateTable::us(),
            STATE_CANDIDATE_KEYS.iter().map(|k| k.to_string()).collect(),
            CANONICAL_STATE_FIELD,
        )
    }
}

impl StateResolver {
    pub fn new(
        table: StateTable,
        candidate_keys: Vec<String>,
        canonical_field: impl Into<String>,
    ) -> Self {
        Self {
            table,
            candidate_keys,
            canonical_field: canonical_field.into(),
            // Upper-case only: lower-case words like "in" or "me" are not states.
            token: Regex::new(r"\b[A-Z]{2}\b").expect("static state token pattern"),
        }
    }

    pub fn table(&self) -> &StateTable {
        &self.table
    }

    /// Bind the resolver to a dataset's code lookup.
    pub fn matcher<'a>(&'a self, lookup: &'a CodeLookup) -> StateMatcher<'a> {
        StateMatcher {
            resolver: self,
            lookup,
        }
    }

    /// Match free text: exact name, then abbreviation, then an embedded
    /// two-letter token.
    pub fn match_text(&self, text: &str) -> Option<&str> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if let Some(name) = self.table.name_match(text) {
            return Some(name);
        }
        if let Some(name) = self.table.abbreviation_match(text) {
            return Some(name);
        }
        self.token
            .find_iter(text)
            .find_map(|m| self.table.abbreviation_match(m.as_str()))
    }
}

/// A [`StateResolver`] paired with the code lookup of one dataset.
#[derive(Debug, Clone, Copy)]
pub struct StateMatcher<'a> {
    resolver: &'a StateResolver,
    lookup: &'a CodeLookup,
}

impl<'a> StateMatcher<'a> {
    /// Canonical full name for a user-supplied state (name or abbreviation).
    pub fn canonical_name(&self, input: &str) -> Option<&'a str> {
        let resolver: &'a StateResolver = self.resolver;
        let trimmed = input.trim();
        resolver
            .table
            .name_match(trimmed)
            .or_else(|| resolver.table.abbreviation_match(trimmed))
    }

    /// Resolve a row's state name, or `None` when no candidate key resolves.
    pub fn state_of(&self, row: &NormalizedRecord) -> Option<&'a str> {
        let resolver = self.resolver;
        for key in &resolver.candidate_keys {
            let Some(raw) = row.present(key) else {
                continue;
            };
            if *key == resolver.canonical_field {
                if let Some(mapped) = self.lookup.resolve(key, raw) {
                    if let Some(name) = resolver.match_text(mapped) {
                        return Some(name);
                    }
                }
            }
            if let Some(name) = resolver.match_text(&display_string(raw)) {
                return Some(name);
            }
        }
        None
    }
}

/// Per-state counts and shares of resolvable rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateAggregate {
    pub counts: BTreeMap<String, usize>,
    pub pcts: BTreeMap<String, f64>,
    /// Rows that resolved to a state; unresolved rows are not counted.
    pub total: usize,
    /// Largest single-state share, used to normalize the map colour scale.
    pub max_pct: f64,
}

/// Resolve a single row's state name.
pub fn resolve_state_name<'a>(row: &NormalizedRecord, matcher: &StateMatcher<'a>) -> Option<&'a str> {
    matcher.state_of(row)
}

/// Count rows per state and compute each state's share.
pub fn aggregate_by_state<'r, I>(rows: I, matcher: &StateMatcher<'_>) -> StateAggregate
where
    I: IntoIterator<Item = &'r NormalizedRecord>,
{
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total = 0usize;
    for row in rows {
        if let Some(name) = matcher.state_of(row) {
            *counts.entry(name.to_string()).or_insert(0) += 1;
            total += 1;
        }
    }

    if total == 0 {
        return StateAggregate::default();
    }

    let pcts: BTreeMap<String, f64> = counts
        .iter()
        .map(|(name, count)| (name.clone(), *count as f64 / total as f64 * 100.0))
        .collect();
    let max_pct = pcts.values().copied().fold(0.0, f64::max);

    StateAggregate {
        counts,
        pcts,
        total,
        max_pct,
    }
}
