//! Serializable snapshot of a store's records.

use crate::error::SnapshotError;
use crate::search::IndexableRecord;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Current schema version for the snapshot format.
///
/// Increment this when making breaking changes to the record layout.
/// - v1: Initial format (`catalog` + `records`)
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Exported store contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Schema version this snapshot was written with
    pub schema_version: u32,
    /// Catalog the records belong to (e.g. `"commands"`)
    pub catalog: String,
    /// RFC 3339 timestamp of the export
    pub exported_at: String,
    /// Records in id order
    pub records: Vec<IndexableRecord>,
}

/// Accepted on input: the full envelope, or a bare record array.
#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotInput {
    Envelope(Snapshot),
    Records(Vec<IndexableRecord>),
}

impl Snapshot {
    /// Wraps `records` in a snapshot stamped with the current time.
    pub fn new(catalog: impl Into<String>, records: Vec<IndexableRecord>) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            catalog: catalog.into(),
            exported_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            records,
        }
    }

    /// Serializes to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses snapshot JSON for `catalog`.
    ///
    /// A bare JSON array of records is accepted and treated as the current
    /// schema version for `catalog`.
    pub fn from_json(text: &str, catalog: &str) -> Result<Self, SnapshotError> {
        let snapshot = match serde_json::from_str::<SnapshotInput>(text) {
            Ok(SnapshotInput::Envelope(snapshot)) => snapshot,
            Ok(SnapshotInput::Records(records)) => {
                debug!(records = records.len(), "read bare record array");
                Snapshot::new(catalog, records)
            }
            // Re-parse as the envelope so the error points at the real problem
            Err(_) => serde_json::from_str::<Snapshot>(text)?,
        };

        if snapshot.schema_version != CURRENT_SCHEMA_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: snapshot.schema_version,
                supported: CURRENT_SCHEMA_VERSION,
            });
        }
        if snapshot.catalog != catalog {
            return Err(SnapshotError::CatalogMismatch {
                expected: catalog.to_string(),
                found: snapshot.catalog,
            });
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<IndexableRecord> {
        vec![
            IndexableRecord::new("kb_trr_001")
                .with_field("title", "TRR Validation Best Practices", 10.0)
                .with_category("Best Practices"),
        ]
    }

    #[test]
    fn test_roundtrip() {
        let snapshot = Snapshot::new("knowledge", sample());
        let json = snapshot.to_json().unwrap();
        let back = Snapshot::from_json(&json, "knowledge").unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn test_bare_array_accepted() {
        let json = serde_json::to_string(&sample()).unwrap();
        let snapshot = Snapshot::from_json(&json, "knowledge").unwrap();
        assert_eq!(snapshot.catalog, "knowledge");
        assert_eq!(snapshot.records, sample());
    }

    #[test]
    fn test_catalog_mismatch() {
        let json = Snapshot::new("commands", sample()).to_json().unwrap();
        let err = Snapshot::from_json(&json, "knowledge").unwrap_err();
        assert!(matches!(err, SnapshotError::CatalogMismatch { .. }));
    }

    #[test]
    fn test_unsupported_version() {
        let mut snapshot = Snapshot::new("content", Vec::new());
        snapshot.schema_version = 99;
        let json = snapshot.to_json().unwrap();
        let err = Snapshot::from_json(&json, "content").unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::UnsupportedVersion {
                found: 99,
                supported: 1
            }
        ));
    }

    #[test]
    fn test_malformed_json() {
        let err = Snapshot::from_json("{ not json", "content").unwrap_err();
        assert!(matches!(err, SnapshotError::Json(_)));
    }
}
