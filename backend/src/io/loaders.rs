use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::models::{FieldCatalog, Record, ReferenceEntry};

/// Name used in error messages for inputs that did not come from a file.
const INLINE_SOURCE: &str = "<inline>";

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `message` starts with the JSON path of the offending value.
    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}

fn parse_json<T: DeserializeOwned>(json: &str, source: &str) -> Result<T, LoadError> {
    let de = &mut serde_json::Deserializer::from_str(json);
    serde_path_to_error::deserialize(de).map_err(|err| {
        let at = err.path().to_string();
        LoadError::Parse {
            path: source.to_string(),
            message: format!("at {}: {}", at, err.into_inner()),
        }
    })
}

fn read_file(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn records_from(json: &str, source: &str) -> Result<Vec<Record>, LoadError> {
    let values: Vec<Value> = parse_json(json, source)?;
    let total = values.len();
    let records: Vec<Record> = values
        .into_iter()
        .filter_map(|v| match v {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();
    if records.len() < total {
        log::debug!(
            "Skipped {} non-object entries in {}",
            total - records.len(),
            source
        );
    }
    Ok(records)
}

fn catalog_from(json: &str, source: &str) -> Result<FieldCatalog, LoadError> {
    let names: HashMap<String, String> = parse_json(json, source)?;
    Ok(FieldCatalog::new(names))
}

/// Parse a JSON array of rows. Entries that are not objects are skipped.
pub fn parse_records(json: &str) -> Result<Vec<Record>, LoadError> {
    records_from(json, INLINE_SOURCE)
}

/// Parse a `[{NAME, START, LABEL}]` reference table.
pub fn parse_reference_table(json: &str) -> Result<Vec<ReferenceEntry>, LoadError> {
    parse_json(json, INLINE_SOURCE)
}

/// Parse a `{code: display name}` field catalog.
pub fn parse_field_catalog(json: &str) -> Result<FieldCatalog, LoadError> {
    catalog_from(json, INLINE_SOURCE)
}

/// File-based counterparts of the `parse_*` functions.
pub struct DatasetLoader;

impl DatasetLoader {
    pub fn load_records_file(path: &Path) -> Result<Vec<Record>, LoadError> {
        let json = read_file(path)?;
        records_from(&json, &path.display().to_string())
    }

    pub fn load_reference_file(path: &Path) -> Result<Vec<ReferenceEntry>, LoadError> {
        let json = read_file(path)?;
        parse_json(&json, &path.display().to_string())
    }

    pub fn load_catalog_file(path: &Path) -> Result<FieldCatalog, LoadError> {
        let json = read_file(path)?;
        catalog_from(&json, &path.display().to_string())
    }
}
