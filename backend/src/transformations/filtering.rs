//! Scope filters over normalized rows.
//!
//! Every filter borrows its input and returns references in the original
//! order, so a scope is always a view over the immutable dataset. The stages
//! compose in a fixed order: models, then cluster, then state.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::NormalizedRecord;
use crate::services::geography::StateMatcher;

/// Keep rows whose model is in `active_models`.
///
/// An empty model list means "no filter" and returns every row: deselecting
/// all models in the UI shows the whole population rather than nothing.
pub fn filter_by_models<'a, I>(rows: I, active_models: &[String]) -> Vec<&'a NormalizedRecord>
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    if active_models.is_empty() {
        return rows.into_iter().collect();
    }
    let active: HashSet<&str> = active_models.iter().map(String::as_str).collect();
    rows.into_iter()
        .filter(|r| active.contains(r.model.as_str()))
        .collect()
}

/// Keep rows of one cluster, or every row when `cluster` is `None`.
pub fn filter_by_cluster<'a, I>(rows: I, cluster: Option<i64>) -> Vec<&'a NormalizedRecord>
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    match cluster {
        None => rows.into_iter().collect(),
        Some(id) => rows.into_iter().filter(|r| r.cluster == id).collect(),
    }
}

/// Keep rows resolving to the given state, or every row when `state` is `None`.
///
/// The requested state may be a full name or an abbreviation. A state the
/// matcher cannot recognise matches no row.
pub fn filter_by_state<'a, I>(
    rows: I,
    state: Option<&str>,
    matcher: &StateMatcher<'_>,
) -> Vec<&'a NormalizedRecord>
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    let Some(requested) = state else {
        return rows.into_iter().collect();
    };
    let Some(target) = matcher.canonical_name(requested) else {
        return Vec::new();
    };
    rows.into_iter()
        .filter(|r| matcher.state_of(r) == Some(target))
        .collect()
}

/// Active filter selection for one panel.
///
/// `locked` makes the panel ignore every filter and use the full population.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScopeFilters {
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub cluster: Option<i64>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub locked: bool,
}

impl ScopeFilters {
    pub fn new(models: Vec<String>) -> Self {
        Self {
            models,
            ..Default::default()
        }
    }

    pub fn with_cluster(mut self, cluster: Option<i64>) -> Self {
        self.cluster = cluster;
        self
    }

    pub fn with_state(mut self, state: Option<String>) -> Self {
        self.state = state;
        self
    }

    pub fn with_lock(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    /// Model filter only.
    pub fn baseline<'a>(&self, rows: &'a [NormalizedRecord]) -> Vec<&'a NormalizedRecord> {
        if self.locked {
            return rows.iter().collect();
        }
        filter_by_models(rows, &self.models)
    }

    /// Model and cluster filters; the state selection is ignored.
    pub fn without_state<'a>(&self, rows: &'a [NormalizedRecord]) -> Vec<&'a NormalizedRecord> {
        if self.locked {
            return rows.iter().collect();
        }
        filter_by_cluster(filter_by_models(rows, &self.models), self.cluster)
    }

    /// Full scope: models, then cluster, then state.
    pub fn apply<'a>(
        &self,
        rows: &'a [NormalizedRecord],
        matcher: &StateMatcher<'_>,
    ) -> Vec<&'a NormalizedRecord> {
        if self.locked {
            return rows.iter().collect();
        }
        let scoped = self.without_state(rows);
        filter_by_state(scoped, self.state.as_deref(), matcher)
    }
}
