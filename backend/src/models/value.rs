//! Coercion helpers for loosely typed JSON field values.
//!
//! Survey exports mix numbers, numeric strings, currency strings and nulls in
//! the same column. These helpers give every aggregation the same view of
//! "missing", "numeric" and "display text".

use serde_json::{Number, Value};

/// True for null and for strings that are empty after trimming.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// True when a field is absent, null or blank.
pub fn is_missing(value: Option<&Value>) -> bool {
    value.map_or(true, is_blank)
}

/// Coerce a value to a finite number.
///
/// Numbers pass through; strings are trimmed and parsed. Null, blank,
/// booleans and unparsable strings yield `None`.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Coerce a currency-like value (`"$35,200"`) to a finite number.
///
/// Only `$` and `,` are stripped; the rest is trimmed and parsed, so a digit
/// group separated by a space (`"35 200"`) is not a number.
pub fn coerce_currency(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => {
            let cleaned: String = s.chars().filter(|c| *c != '$' && *c != ',').collect();
            let cleaned = cleaned.trim();
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        other => coerce_number(other),
    }
}

/// Canonical text for a number: integral values print without a fraction.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn format_json_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        n.as_f64().map(format_number).unwrap_or_else(|| n.to_string())
    }
}

/// Stringify a raw value the way it should appear as a fallback label.
pub fn display_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => format_json_number(n),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Canonical numeric key for a code, e.g. `"01"`, `"1.0"` and `1` all map to `"1"`.
pub fn numeric_key(value: &Value) -> Option<String> {
    coerce_number(value).map(format_number)
}
