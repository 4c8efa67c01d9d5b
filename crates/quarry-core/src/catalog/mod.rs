//! Typed catalogs built on the generic [`RecordEngine`].
//!
//! The portal runs three independent engines, one per catalog:
//!
//! | Kind | Item | Resolves by |
//! |------|------|-------------|
//! | [`Commands`] | [`CommandDescriptor`] | command name and aliases |
//! | [`KnowledgeBase`] | [`KnowledgeArticle`] | article id |
//! | [`ContentLibrary`] | [`ContentItem`] | item id |
//!
//! Each kind supplies its category enumeration, its item → record
//! conversion (field weights included) and a built-in default corpus.
//!
//! # Usage
//!
//! ```
//! use quarry_core::catalog::{Catalog, KnowledgeBase};
//! use quarry_core::config::EngineConfig;
//! use quarry_core::search::SearchFilters;
//!
//! let kb = Catalog::<KnowledgeBase>::with_defaults(EngineConfig::default());
//! let hits = kb.search("trr validation", &SearchFilters::default());
//! assert_eq!(hits[0].record.id.as_str(), "kb_trr_001");
//! ```

mod commands;
mod content;
mod knowledge;

pub use commands::{CommandCategory, CommandDescriptor, Commands};
pub use content::{ContentCategory, ContentItem, ContentLibrary};
pub use knowledge::{KnowledgeArticle, KnowledgeBase, KnowledgeCategory};

use crate::config::EngineConfig;
use crate::search::{
    IndexableRecord, IntegrityReport, RecordEngine, RecordId, Recommendation, SearchFilters,
    SearchHit, SharedEngine, UpsertOutcome,
};
use crate::storage::Snapshot;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use tracing::info;

/// One catalog instantiation of the engine.
pub trait CatalogKind {
    /// Typed item stored in this catalog.
    type Item: Into<IndexableRecord>;

    /// Catalog name written into snapshots (e.g. `"commands"`).
    const NAME: &'static str;

    /// The closed category enumeration, as stored on records.
    fn categories() -> Vec<String>;

    /// Built-in corpus loaded by [`Catalog::seed_defaults`].
    fn default_corpus() -> Vec<Self::Item>;
}

/// Difficulty scale shared by commands and content items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
            Difficulty::Expert => "expert",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed, lock-guarded engine for catalog `K`.
///
/// Cloning shares the underlying engine.
#[derive(Debug)]
pub struct Catalog<K: CatalogKind> {
    engine: SharedEngine,
    _kind: PhantomData<K>,
}

impl<K: CatalogKind> Clone for Catalog<K> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: CatalogKind> Catalog<K> {
    /// Creates an empty catalog.
    pub fn new(config: EngineConfig) -> Self {
        Self::from_engine(RecordEngine::new(config, K::categories()))
    }

    /// Creates a catalog seeded with the kind's default corpus.
    pub fn with_defaults(config: EngineConfig) -> Self {
        let catalog = Self::new(config);
        catalog.seed_defaults();
        catalog
    }

    /// Creates a catalog from previously exported records.
    pub fn from_snapshot(config: EngineConfig, records: Vec<IndexableRecord>) -> Self {
        Self::from_engine(RecordEngine::from_snapshot(config, K::categories(), records))
    }

    fn from_engine(engine: RecordEngine) -> Self {
        Self {
            engine: SharedEngine::new(engine),
            _kind: PhantomData,
        }
    }

    /// Loads the built-in corpus.
    pub fn seed_defaults(&self) -> Vec<UpsertOutcome> {
        let outcomes = self.upsert_batch(K::default_corpus());
        info!(catalog = K::NAME, records = outcomes.len(), "Seeded default corpus");
        outcomes
    }

    pub fn upsert(&self, item: K::Item) -> UpsertOutcome {
        self.engine.upsert(item.into())
    }

    /// Upserts items in order under one write lock.
    pub fn upsert_batch(&self, items: Vec<K::Item>) -> Vec<UpsertOutcome> {
        self.engine.upsert_batch(items.into_iter().map(Into::into).collect())
    }

    pub fn remove(&self, id: &RecordId) -> bool {
        self.engine.remove(id)
    }

    /// Resolves a primary name or alias, case-insensitively.
    pub fn resolve_exact(&self, name: &str) -> Option<IndexableRecord> {
        self.engine.resolve_exact(name)
    }

    pub fn search(&self, query: &str, filters: &SearchFilters) -> Vec<SearchHit> {
        self.engine.search(query, filters)
    }

    pub fn search_with_limit(
        &self,
        query: &str,
        filters: &SearchFilters,
        limit: usize,
    ) -> Vec<SearchHit> {
        self.engine.search_with_limit(query, filters, limit)
    }

    /// Records most similar to `id` across the whole catalog.
    pub fn recommend(&self, id: &RecordId, limit: usize) -> Vec<Recommendation> {
        self.engine.recommend_for(id, limit)
    }

    pub fn validate(&self) -> IntegrityReport {
        self.engine.validate()
    }

    /// Snapshot of every record, tagged with [`CatalogKind::NAME`].
    pub fn export(&self) -> Snapshot {
        self.engine.export(K::NAME)
    }

    pub fn len(&self) -> usize {
        self.engine.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engine.is_empty()
    }

    /// The shared engine behind this catalog.
    pub fn engine(&self) -> &SharedEngine {
        &self.engine
    }
}

/// Joins list values into one searchable text field.
pub(crate) fn joined(values: &[String]) -> String {
    values.join(" ")
}
