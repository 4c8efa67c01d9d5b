//! Error types for quarry-core.
//!
//! The engine's own operations never fail: data-quality problems surface as
//! [`Diagnostic`](crate::search::Diagnostic)s and integrity reports. The
//! errors here cover the edges where external input is parsed.

use thiserror::Error;

/// Errors that can occur while loading an [`EngineConfig`](crate::config::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed
    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors that can occur while reading or writing a record snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Snapshot JSON is malformed or does not match the record schema
    #[error("Malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),
    /// Snapshot was written by an incompatible schema version
    #[error("Unsupported snapshot schema version {found} (supported: {supported})")]
    UnsupportedVersion {
        /// Version found in the snapshot
        found: u32,
        /// Version this build reads and writes
        supported: u32,
    },
    /// Snapshot belongs to a different catalog
    #[error("Snapshot is for catalog '{found}', expected '{expected}'")]
    CatalogMismatch {
        /// Catalog name the caller asked for
        expected: String,
        /// Catalog name recorded in the snapshot
        found: String,
    },
}
