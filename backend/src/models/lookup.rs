//! Reference tables: code-to-label lookups and field display names.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::value::{display_string, numeric_key};

/// One row of the reference table: `code` of field `name` reads as `label`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    #[serde(rename = "NAME")]
    pub name: String,
    #[serde(rename = "START")]
    pub start: Value,
    #[serde(rename = "LABEL")]
    pub label: String,
}

/// Field name -> (raw code -> human label).
///
/// Built once from the reference table and never mutated afterwards. Codes are
/// stored under their display text and, for numeric codes, also under their
/// canonical numeric form so that `1`, `"1"` and `"01"` resolve alike.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeLookup {
    tables: HashMap<String, HashMap<String, String>>,
}

impl CodeLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a lookup from reference entries. The first label seen for a code wins.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = ReferenceEntry>,
    {
        let mut tables: HashMap<String, HashMap<String, String>> = HashMap::new();
        for entry in entries {
            let name = entry.name.trim();
            if name.is_empty() {
                continue;
            }
            let table = tables.entry(name.to_string()).or_default();
            let key = display_string(&entry.start).trim().to_string();
            if let Some(num) = numeric_key(&entry.start) {
                table.entry(num).or_insert_with(|| entry.label.clone());
            }
            table.entry(key).or_insert(entry.label);
        }
        Self { tables }
    }

    /// Whether any code mapping exists for `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.tables.contains_key(field)
    }

    pub fn field_count(&self) -> usize {
        self.tables.len()
    }

    /// Mapped label for a raw value, if the reference table knows it.
    ///
    /// Tries the exact raw text, then the trimmed text, then the canonical
    /// numeric form.
    pub fn resolve(&self, field: &str, raw: &Value) -> Option<&str> {
        let table = self.tables.get(field)?;
        let text = display_string(raw);
        if let Some(label) = table.get(&text) {
            return Some(label);
        }
        let trimmed = text.trim();
        if trimmed.len() != text.len() {
            if let Some(label) = table.get(trimmed) {
                return Some(label);
            }
        }
        numeric_key(raw).and_then(|key| table.get(&key)).map(String::as_str)
    }

    /// Label for a raw value, falling back to the stringified raw value.
    pub fn label_for(&self, field: &str, raw: &Value) -> String {
        match self.resolve(field, raw) {
            Some(label) => label.to_string(),
            None => display_string(raw),
        }
    }
}

/// Display names for field codes plus named groups of fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldCatalog {
    #[serde(default)]
    pub display_names: HashMap<String, String>,
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<String>>,
}

impl FieldCatalog {
    pub fn new(display_names: HashMap<String, String>) -> Self {
        Self {
            display_names,
            groups: BTreeMap::new(),
        }
    }

    pub fn with_group(mut self, name: impl Into<String>, fields: Vec<String>) -> Self {
        self.groups.insert(name.into(), fields);
        self
    }

    /// Human-readable name of a field, or the field code itself.
    pub fn display_name<'a>(&'a self, field: &'a str) -> &'a str {
        self.display_names
            .get(field)
            .map(String::as_str)
            .unwrap_or(field)
    }

    pub fn group(&self, name: &str) -> Option<&[String]> {
        self.groups.get(name).map(Vec::as_slice)
    }
}
