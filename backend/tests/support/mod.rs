#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use serde_json::Value;
use segment_insights::models::{NormalizedRecord, Record};
use segment_insights::transformations::normalize;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores the variables on unwind and serializes access to the process
/// environment, since tests run in parallel.
///
/// `Some(v)` sets a variable, `None` removes it.
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Raw records from a JSON array literal.
pub fn records(value: Value) -> Vec<Record> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(|v| v.as_object().cloned()).collect())
        .unwrap_or_default()
}

/// Normalized rows from a JSON array literal.
pub fn rows(value: Value) -> Vec<NormalizedRecord> {
    normalize(records(value))
}

/// A small survey with three models, two clusters and four states.
pub fn survey_json() -> Value {
    serde_json::json!([
        {"model": "Civic", "cluster": 1, "emb_x": 0.1, "emb_y": 0.2, "STATE": "CA",
         "AGE": "25-34", "SEX": 1, "FIN_PRICE_UNEDITED": "$29,999", "FIN_MONTHLY_PAYMENT": 350,
         "STATE_ENJOY": "Strongly agree", "OL_MODEL_GRP": "Loyal"},
        {"model": "Civic", "cluster": 1, "emb_x": 0.3, "emb_y": 0.1, "STATE": "California",
         "AGE": "35-44", "SEX": 2, "FIN_PRICE_UNEDITED": "$35,200", "FIN_MONTHLY_PAYMENT": "$450",
         "STATE_ENJOY": "Agree", "OL_MODEL_GRP": "Defector"},
        {"model": "Civic", "cluster": 2, "emb_x": 1.1, "emb_y": 1.4, "STATE": "TX",
         "AGE": "25-34", "SEX": 1, "FIN_PRICE_UNEDITED": 52000,
         "STATE_ENJOY_TXT": "Somewhat agree"},
        {"MODEL": "Accord", "cluster": 2, "emb_x": 1.3, "emb_y": 1.2, "STATE": "New York",
         "AGE": "", "SEX": 2, "FIN_PRICE_UNEDITED": "$112,500", "FIN_MONTHLY_PAYMENT": 900,
         "STATE_ENJOY": "Disagree"},
        {"model_name": "Pilot", "cluster": 3, "emb_x": -0.5, "emb_y": 2.0, "RES_STATE": "Lives in WA",
         "AGE": "55+", "FIN_PRICE_UNEDITED": "n/a"},
        {"model": "Pilot", "cluster": "x", "emb_x": 0.0, "emb_y": 0.0, "STATE": "OR"},
        {"model": "", "cluster": 1, "emb_x": 0.0, "emb_y": 0.0, "STATE": "OR"}
    ])
}

pub fn reference_json() -> Value {
    serde_json::json!([
        {"NAME": "SEX", "START": 1, "LABEL": "Male"},
        {"NAME": "SEX", "START": "2", "LABEL": "Female"}
    ])
}
