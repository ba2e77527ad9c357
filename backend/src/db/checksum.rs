//! Content checksums for dataset deduplication.

use sha2::{Digest, Sha256};

use crate::models::{Record, ReferenceEntry};

/// SHA-256 of a string, hex encoded.
pub fn calculate_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Checksum of an upload: raw rows plus the reference table.
///
/// Rows are hashed in their serialized JSON form, so two uploads of the same
/// rows in the same order collide regardless of the dataset name.
pub fn dataset_checksum(rows: &[Record], reference: &[ReferenceEntry]) -> String {
    let mut hasher = Sha256::new();
    for row in rows {
        hasher.update(serde_json::Value::Object(row.clone()).to_string().as_bytes());
        hasher.update(b"\n");
    }
    hasher.update(b"--reference--\n");
    for entry in reference {
        hasher.update(entry.name.as_bytes());
        hasher.update(b"\t");
        hasher.update(entry.start.to_string().as_bytes());
        hasher.update(b"\t");
        hasher.update(entry.label.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(value: serde_json::Value) -> Vec<Record> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    #[test]
    fn test_checksum_consistency() {
        let content = r#"{"test": "data"}"#;
        assert_eq!(calculate_checksum(content), calculate_checksum(content));
        assert_eq!(calculate_checksum(content).len(), 64);
    }

    #[test]
    fn test_dataset_checksum_changes_with_content() {
        let a = rows(json!([{"model": "A", "cluster": 1}]));
        let b = rows(json!([{"model": "B", "cluster": 1}]));
        assert_eq!(dataset_checksum(&a, &[]), dataset_checksum(&a, &[]));
        assert_ne!(dataset_checksum(&a, &[]), dataset_checksum(&b, &[]));

        let reference = vec![ReferenceEntry {
            name: "SEX".into(),
            start: json!(1),
            label: "Male".into(),
        }];
        assert_ne!(dataset_checksum(&a, &[]), dataset_checksum(&a, &reference));
    }
}
