//! Catalog loading and export.

use anyhow::{Context, Result};
use quarry_core::catalog::{Catalog, CatalogKind};
use quarry_core::config::EngineConfig;
use quarry_core::storage::Snapshot;
use std::path::PathBuf;
use tracing::{info, warn};

/// Opens catalog `K` from a snapshot file, or seeds its built-in corpus.
pub fn open<K: CatalogKind>(
    config: EngineConfig,
    snapshot: Option<&PathBuf>,
) -> Result<Catalog<K>> {
    let Some(path) = snapshot else {
        info!("Loading built-in {} corpus", K::NAME);
        return Ok(Catalog::with_defaults(config));
    };

    info!("Opening snapshot: {}", path.display());
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
    let snapshot = Snapshot::from_json(&text, K::NAME)
        .with_context(|| format!("Failed to load snapshot: {}", path.display()))?;

    let catalog = Catalog::from_snapshot(config, snapshot.records);
    if catalog.is_empty() {
        warn!("Snapshot {} contains no records", path.display());
    }
    info!("Loaded {} records", catalog.len());
    Ok(catalog)
}

/// Writes the catalog as a JSON snapshot to `output`, or stdout.
pub fn export<K: CatalogKind>(catalog: &Catalog<K>, output: Option<&PathBuf>) -> Result<()> {
    let json = catalog.export().to_json().context("Failed to serialize snapshot")?;

    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write snapshot: {}", path.display()))?;
            info!("Wrote {} records to {}", catalog.len(), path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
