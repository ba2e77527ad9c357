use log::debug;
use serde_json::Value;

use crate::models::value::{coerce_number, display_string};
use crate::models::{NormalizedRecord, Record};

/// Field names that may carry the model identifier, in priority order.
pub const MODEL_ALIASES: &[&str] = &[
    "model",
    "MODEL",
    "Model",
    "model_name",
    "MODEL_NAME",
    "OL_MODEL",
];

/// Normalized rows plus the number of raw rows that were dropped.
#[derive(Debug, Clone, Default)]
pub struct NormalizeReport {
    pub rows: Vec<NormalizedRecord>,
    pub dropped: usize,
}

/// Resolve the model from the first alias holding a non-empty value.
fn resolve_model(raw: &Record) -> Option<String> {
    MODEL_ALIASES.iter().find_map(|key| {
        let value = raw.get(*key)?;
        let text = match value {
            Value::String(s) => s.trim().to_string(),
            Value::Number(_) => display_string(value),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    })
}

/// Validate a single raw row.
///
/// Returns `None` when the model is empty or any of `cluster`, `emb_x` or
/// `emb_y` is not a finite number. A fractional cluster is truncated.
pub fn normalize_record(raw: Record) -> Option<NormalizedRecord> {
    let model = resolve_model(&raw)?;
    let cluster = raw.get("cluster").and_then(coerce_number)?;
    let emb_x = raw.get("emb_x").and_then(coerce_number)?;
    let emb_y = raw.get("emb_y").and_then(coerce_number)?;

    Some(NormalizedRecord {
        model,
        cluster: cluster.trunc() as i64,
        emb_x,
        emb_y,
        fields: raw,
    })
}

/// Normalize raw rows, counting the dropped ones.
pub fn normalize_with_report(raw: Vec<Record>) -> NormalizeReport {
    let total = raw.len();
    let rows: Vec<NormalizedRecord> = raw.into_iter().filter_map(normalize_record).collect();
    let dropped = total - rows.len();
    if dropped > 0 {
        debug!("Dropped {} of {} rows during normalization", dropped, total);
    }
    NormalizeReport { rows, dropped }
}

/// Normalize raw rows. Malformed rows are excluded silently.
pub fn normalize(raw: Vec<Record>) -> Vec<NormalizedRecord> {
    normalize_with_report(raw).rows
}
