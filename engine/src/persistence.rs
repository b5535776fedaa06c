//! Persistence module for export/import of finished identities
//!
//! Three shapes leave the engine:
//! - a versioned JSON envelope for storage
//! - a flat key-value document with stable dotted keys
//!   (`family.siblings.0.name.first`) for column stores
//! - an opaque bincode blob for the backup/encryption workflow
//!
//! A fourth, one-way shape renders the flat document for reading, with dates
//! and pay in the country's conventions.
//!
//! Imported records keep their status unless the caller asks to mark them
//! `Recovered`.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::components::{Identity, IdentityStatus};
use crate::rules::RuleSet;

/// Current envelope schema.
pub const EXPORT_VERSION: u8 = 1;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("blob error: {0}")]
    Blob(#[from] bincode::Error),

    #[error("unsupported export version: {0}")]
    UnsupportedVersion(u8),

    #[error("malformed flat document: {0}")]
    MalformedDocument(String),
}

// ============================================================================
// Export Data Structures
// ============================================================================

/// Versioned envelope around a set of records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportData {
    pub version: u8, // Schema version for forward compatibility
    pub identities: Vec<Identity>,
}

/// Result of an import
#[derive(Debug, Clone)]
pub struct ImportResult {
    pub identities: Vec<Identity>,
    pub recovered: usize,
}

// ============================================================================
// JSON Envelope
// ============================================================================

pub fn export_identities(identities: &[Identity]) -> Result<String, PersistenceError> {
    let data = ExportData {
        version: EXPORT_VERSION,
        identities: identities.to_vec(),
    };
    Ok(serde_json::to_string(&data)?)
}

pub fn import_identities(json: &str, mark_recovered: bool) -> Result<ImportResult, PersistenceError> {
    let data: ExportData = serde_json::from_str(json)?;
    if data.version != EXPORT_VERSION {
        return Err(PersistenceError::UnsupportedVersion(data.version));
    }

    let mut identities = data.identities;
    if mark_recovered {
        for identity in identities.iter_mut() {
            identity.status = IdentityStatus::Recovered;
        }
    }
    let recovered = identities
        .iter()
        .filter(|i| i.status == IdentityStatus::Recovered)
        .count();
    Ok(ImportResult { identities, recovered })
}

// ============================================================================
// Flat Document
// ============================================================================

/// Flattens a record into dotted keys. Array elements are keyed by index;
/// empty arrays and objects stay as leaves so the inverse can restore them.
pub fn to_flat_document(identity: &Identity) -> Result<BTreeMap<String, Value>, PersistenceError> {
    let mut doc = BTreeMap::new();
    flatten(String::new(), serde_json::to_value(identity)?, &mut doc);
    Ok(doc)
}

fn flatten(prefix: String, value: Value, doc: &mut BTreeMap<String, Value>) {
    let join = |key: &str| if prefix.is_empty() { key.to_string() } else { format!("{}.{}", prefix, key) };
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, v) in map {
                flatten(join(&key), v, doc);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (i, v) in items.into_iter().enumerate() {
                flatten(join(&i.to_string()), v, doc);
            }
        }
        leaf => {
            doc.insert(prefix, leaf);
        }
    }
}

pub fn from_flat_document(doc: &BTreeMap<String, Value>) -> Result<Identity, PersistenceError> {
    let mut root = Value::Object(Map::new());
    for (key, value) in doc {
        insert_path(&mut root, key, value.clone())?;
    }
    Ok(serde_json::from_value(root)?)
}

fn insert_path(root: &mut Value, key: &str, value: Value) -> Result<(), PersistenceError> {
    let malformed = || PersistenceError::MalformedDocument(format!("conflicting key '{}'", key));
    let segments: Vec<&str> = key.split('.').collect();
    let mut node = root;

    for (depth, segment) in segments.iter().enumerate() {
        let last = depth + 1 == segments.len();
        let next_is_index = segments
            .get(depth + 1)
            .map_or(false, |s| s.parse::<usize>().is_ok());
        let fresh = || if next_is_index { Value::Array(Vec::new()) } else { Value::Object(Map::new()) };

        let slot = match node {
            Value::Object(map) => map.entry(segment.to_string()).or_insert(Value::Null),
            Value::Array(items) => {
                let idx: usize = segment.parse().map_err(|_| malformed())?;
                if items.len() <= idx {
                    items.resize(idx + 1, Value::Null);
                }
                &mut items[idx]
            }
            _ => return Err(malformed()),
        };

        if last {
            if !slot.is_null() {
                return Err(malformed());
            }
            *slot = value;
            return Ok(());
        }
        if slot.is_null() {
            *slot = fresh();
        }
        node = slot;
    }
    Ok(())
}

// ============================================================================
// Display Document
// ============================================================================

const PAY_KEYS: &[&str] = &["employment.salary", "employment.previous_salary", "employment.pension"];

/// The flat document with dates in the country's format and pay amounts with
/// the currency symbol. There is no inverse.
pub fn to_display_document(identity: &Identity, rules: &RuleSet) -> Result<BTreeMap<String, Value>, PersistenceError> {
    let mut doc = to_flat_document(identity)?;
    for (key, value) in doc.iter_mut() {
        let rendered = match value {
            Value::String(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .map(|date| rules.format_date(date)),
            Value::Number(n) if PAY_KEYS.contains(&key.as_str()) => n
                .as_u64()
                .and_then(|amount| u32::try_from(amount).ok())
                .map(|amount| rules.format_amount(amount)),
            _ => None,
        };
        if let Some(text) = rendered {
            *value = Value::String(text);
        }
    }
    Ok(doc)
}

// ============================================================================
// Binary Blob
// ============================================================================

pub fn to_blob(identity: &Identity) -> Result<Vec<u8>, PersistenceError> {
    Ok(bincode::serialize(identity)?)
}

pub fn from_blob(bytes: &[u8]) -> Result<Identity, PersistenceError> {
    Ok(bincode::deserialize(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample_data::{sample_data, sample_rules};
    use crate::systems::fixtures::today;
    use crate::world::{GenerationRequest, IdentityGenerator};
    use std::sync::Arc;

    fn identities(n: u64) -> Vec<Identity> {
        let gen = IdentityGenerator::new(sample_rules(), Arc::new(sample_data()))
            .unwrap()
            .with_today(today());
        (0..n)
            .map(|seed| gen.generate_seeded(seed, &GenerationRequest::aged(40, 70)).unwrap())
            .collect()
    }

    #[test]
    fn test_export_import_keeps_status_unless_asked() {
        let records = identities(3);
        let json = export_identities(&records).unwrap();

        let kept = import_identities(&json, false).unwrap();
        assert_eq!(kept.identities, records);
        assert_eq!(kept.recovered, 0);

        let recovered = import_identities(&json, true).unwrap();
        assert_eq!(recovered.recovered, 3);
        assert!(recovered.identities.iter().all(|i| i.status == IdentityStatus::Recovered));
    }

    #[test]
    fn test_import_rejects_other_versions() {
        let json = r#"{"version":2,"identities":[]}"#;
        assert!(matches!(
            import_identities(json, false),
            Err(PersistenceError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn test_flat_document_keys() {
        let record = identities(8)
            .into_iter()
            .find(|i| !i.family.siblings.is_empty())
            .expect("some record has siblings");
        let doc = to_flat_document(&record).unwrap();

        assert_eq!(doc["full_name"], Value::String(record.full_name.clone()));
        assert_eq!(
            doc["family.siblings.0.name.first"],
            Value::String(record.family.siblings[0].name.first.clone())
        );
        assert_eq!(from_flat_document(&doc).unwrap(), record);
    }

    #[test]
    fn test_flat_document_keeps_empty_collections() {
        let mut record = identities(1).remove(0);
        record.hobbies.clear();
        record.family.children.clear();
        let doc = to_flat_document(&record).unwrap();
        assert_eq!(doc["hobbies"], Value::Array(Vec::new()));
        assert_eq!(from_flat_document(&doc).unwrap(), record);
    }

    #[test]
    fn test_conflicting_keys_rejected() {
        let mut doc = BTreeMap::new();
        doc.insert("name".to_string(), Value::String("x".to_string()));
        doc.insert("name.first".to_string(), Value::String("y".to_string()));
        assert!(matches!(
            from_flat_document(&doc),
            Err(PersistenceError::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_display_document_uses_country_formats() {
        let rules = sample_rules();
        let record = identities(8)
            .into_iter()
            .find(|i| i.employment.as_ref().map_or(false, |e| e.salary.is_some()))
            .expect("some record is employed");
        let doc = to_display_document(&record, &rules).unwrap();

        assert_eq!(doc["birth_date"], Value::String(rules.format_date(record.birth_date)));
        let salary = record.employment.as_ref().and_then(|e| e.salary).unwrap();
        let shown = doc["employment.salary"].as_str().unwrap();
        assert!(shown.starts_with('€'), "{}", shown);
        assert_eq!(shown, rules.format_amount(salary));
        assert_eq!(doc["employment.currency"], Value::String("EUR".to_string()));
        assert_eq!(doc["full_name"], Value::String(record.full_name.clone()));
    }

    #[test]
    fn test_blob_restores_record() {
        let record = identities(1).remove(0);
        let blob = to_blob(&record).unwrap();
        assert_eq!(from_blob(&blob).unwrap(), record);
        assert!(from_blob(&blob[..blob.len() / 2]).is_err());
    }
}
