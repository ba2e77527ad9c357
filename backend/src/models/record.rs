//! Raw and normalized customer records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A raw input row: flat mapping of field name to string, number or null.
pub type Record = Map<String, Value>;

/// A row that passed normalization.
///
/// `model` is non-empty and `cluster`, `emb_x` and `emb_y` are finite. The
/// original fields are kept untouched in `fields` so that every other
/// aggregation can read the survey attributes by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub model: String,
    pub cluster: i64,
    pub emb_x: f64,
    pub emb_y: f64,
    pub fields: Record,
}

impl NormalizedRecord {
    /// Raw value of a field, if present.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Raw value of a field, treating null and blank strings as absent.
    pub fn present(&self, field: &str) -> Option<&Value> {
        self.fields
            .get(field)
            .filter(|v| !crate::models::value::is_blank(v))
    }
}
