//! Record engine owning the store and every derived index.
//!
//! This module provides the [`RecordEngine`] which orchestrates:
//! - The canonical [`RecordStore`]
//! - The token [`InvertedIndex`]
//! - Category and tag [`ExactIndex`]es
//! - The name/alias [`AliasTable`]
//!
//! # Mutation discipline
//!
//! `upsert`, `update` and `remove` run remove-then-add on every index for the
//! touched id before returning. Name conflicts never fail a mutation; they
//! come back as [`Diagnostic`]s on the [`UpsertOutcome`].
//!
//! When a record stops claiming a name (removed, or re-upserted without it),
//! the name passes to the remaining claimant with the lowest id so that it
//! keeps resolving.

mod shared;


pub use shared::SharedEngine;

use super::keyword::InvertedIndex;
use super::query::QueryEngine;
use super::recommend::Recommender;
use super::secondary::{normalize_key, AliasTable, ExactIndex};
use super::types::{
    Diagnostic, IndexableRecord, IntegrityReport, NameKind, RecordId, RecordPatch, Recommendation,
    SearchFilters, SearchHit, UpsertOutcome,
};
use super::validate::validate;
use crate::config::{EngineConfig, QueryConfig, MAX_RESULT_LIMIT};
use crate::storage::{RecordStore, Snapshot};
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// In-memory indexed retrieval engine for one catalog.
///
/// Construct one per catalog at the application's composition root and pass
/// it around by reference (or through a [`SharedEngine`]).
///
/// # Example
///
/// ```
/// use quarry_core::config::EngineConfig;
/// use quarry_core::search::{IndexableRecord, RecordEngine};
///
/// let mut engine = RecordEngine::new(EngineConfig::default(), ["system"]);
/// engine.upsert(IndexableRecord::new("help").with_name("help").with_alias("?"));
///
/// assert_eq!(engine.resolve_exact("HELP").map(|r| r.id.as_str()), Some("help"));
/// assert_eq!(engine.resolve_exact("?").map(|r| r.id.as_str()), Some("help"));
/// ```
#[derive(Debug, Clone)]
pub struct RecordEngine {
    /// Canonical records
    pub(crate) store: RecordStore,
    /// token -> ids
    pub(crate) inverted: InvertedIndex,
    /// category -> ids
    pub(crate) categories: ExactIndex,
    /// tag -> ids
    pub(crate) tags: ExactIndex,
    /// name/alias -> owning id
    pub(crate) aliases: AliasTable,
    pub(crate) config: EngineConfig,
    /// Closed category enumeration checked by the validator
    pub(crate) category_names: Vec<String>,
}

impl RecordEngine {
    /// Creates an empty engine.
    ///
    /// `categories` is the catalog's closed category enumeration. The config
    /// is clamped via [`EngineConfig::validated`].
    pub fn new<I, C>(config: EngineConfig, categories: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        Self {
            store: RecordStore::new(),
            inverted: InvertedIndex::new(),
            categories: ExactIndex::new(),
            tags: ExactIndex::new(),
            aliases: AliasTable::new(),
            config: config.validated(),
            category_names: categories.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates an engine populated from exported records.
    ///
    /// Records are upserted in the given order, so earlier records win name
    /// conflicts exactly as they did when first written.
    pub fn from_snapshot<I, C>(
        config: EngineConfig,
        categories: I,
        records: Vec<IndexableRecord>,
    ) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        let mut engine = Self::new(config, categories);
        let outcomes = engine.upsert_batch(records);
        let conflicts: usize = outcomes.iter().map(|o| o.diagnostics.len()).sum();
        info!(records = engine.len(), diagnostics = conflicts, "Loaded engine from snapshot");
        engine
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Inserts or fully replaces a record and re-indexes it.
    ///
    /// A blank id is replaced with a generated one. The returned outcome
    /// carries the stored record and any non-fatal diagnostics.
    #[instrument(skip_all, fields(id = %record.id))]
    pub fn upsert(&mut self, mut record: IndexableRecord) -> UpsertOutcome {
        let mut diagnostics = Vec::new();

        if record.id.is_blank() {
            record.id = RecordId::generate();
            debug!(id = %record.id, "generated record id");
            diagnostics.push(Diagnostic::IdGenerated { id: record.id.clone() });
        }

        let id = record.id.clone();
        let stored = self.store.upsert(record);

        self.inverted.reindex(stored, self.config.query.min_token_len);
        self.categories.reindex(&id, stored.category.as_deref());
        self.tags.reindex(&id, stored.tags.iter().map(String::as_str));

        let freed = self.aliases.release(&id);
        diagnostics.extend(self.aliases.claim(&id, name_claims(stored)));
        let record = stored.clone();
        diagnostics.extend(reassign_freed(&self.store, &mut self.aliases, freed));

        debug!(
            tokens = self.inverted.tokens_for(&id).map_or(0, BTreeSet::len),
            diagnostics = diagnostics.len(),
            "record indexed"
        );

        UpsertOutcome { record, diagnostics }
    }

    /// Applies `patch` to an existing record and re-indexes it.
    ///
    /// Returns `None` when `id` is unknown.
    pub fn update(&mut self, id: &RecordId, patch: RecordPatch) -> Option<UpsertOutcome> {
        let mut record = self.store.get(id)?.clone();
        patch.apply(&mut record);
        Some(self.upsert(record))
    }

    /// Removes a record and every index entry for it.
    ///
    /// Returns `false` (and changes nothing) when `id` is unknown.
    #[instrument(skip_all, fields(id = %id))]
    pub fn remove(&mut self, id: &RecordId) -> bool {
        if !self.store.remove(id) {
            return false;
        }

        self.inverted.remove(id);
        self.categories.remove(id);
        self.tags.remove(id);

        let freed = self.aliases.release(id);
        let reassigned = reassign_freed(&self.store, &mut self.aliases, freed);
        debug!(reassigned = reassigned.len(), "record removed");
        true
    }

    /// Upserts records in order, returning one outcome per record.
    pub fn upsert_batch<I>(&mut self, records: I) -> Vec<UpsertOutcome>
    where
        I: IntoIterator<Item = IndexableRecord>,
    {
        let start = Instant::now();
        let outcomes: Vec<UpsertOutcome> = records.into_iter().map(|r| self.upsert(r)).collect();
        info!(
            "Indexed {} records in {:.2}ms ({} tokens)",
            outcomes.len(),
            start.elapsed().as_secs_f64() * 1000.0,
            self.inverted.token_count()
        );
        outcomes
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Looks up a record by id.
    pub fn get(&self, id: &RecordId) -> Option<&IndexableRecord> {
        self.store.get(id)
    }

    /// Owned copy of every record, ordered by id.
    pub fn all(&self) -> Vec<IndexableRecord> {
        self.store.all()
    }

    /// Snapshot of every record tagged with `catalog`.
    pub fn export(&self, catalog: &str) -> Snapshot {
        Snapshot::new(catalog, self.store.all())
    }

    /// Resolves a primary name or alias (case-insensitive) to its record.
    pub fn resolve_exact(&self, name: &str) -> Option<&IndexableRecord> {
        self.aliases.resolve(name).and_then(|id| self.store.get(id))
    }

    /// Ranked full-text search limited to the configured result limit.
    #[instrument(skip_all, fields(query = %query))]
    pub fn search(&self, query: &str, filters: &SearchFilters) -> Vec<SearchHit> {
        self.query_engine(&self.config.query).search(query, filters)
    }

    /// Ranked full-text search returning at most `limit` hits.
    ///
    /// `limit` is clamped to `1..=MAX_RESULT_LIMIT`.
    pub fn search_with_limit(
        &self,
        query: &str,
        filters: &SearchFilters,
        limit: usize,
    ) -> Vec<SearchHit> {
        let mut config = self.config.query.clone();
        config.result_limit = limit.clamp(1, MAX_RESULT_LIMIT);
        self.query_engine(&config).search(query, filters)
    }

    fn query_engine<'a>(&'a self, config: &'a QueryConfig) -> QueryEngine<'a> {
        QueryEngine {
            store: &self.store,
            inverted: &self.inverted,
            categories: &self.categories,
            tags: &self.tags,
            config,
        }
    }

    /// Ranks `pool` by similarity to `reference`.
    pub fn recommend<'a, I>(
        &self,
        reference: &IndexableRecord,
        pool: I,
        limit: usize,
    ) -> Vec<Recommendation>
    where
        I: IntoIterator<Item = &'a IndexableRecord>,
    {
        self.recommender().recommend(reference, pool, limit)
    }

    /// Ranks every other stored record by similarity to record `id`.
    ///
    /// Unknown ids yield no recommendations.
    pub fn recommend_for(&self, id: &RecordId, limit: usize) -> Vec<Recommendation> {
        match self.store.get(id) {
            Some(reference) => self.recommender().recommend(reference, self.store.iter(), limit),
            None => {
                debug!(id = %id, "recommendation reference not found");
                Vec::new()
            }
        }
    }

    fn recommender(&self) -> Recommender {
        Recommender::new(self.config.recommend.clone())
    }

    /// Checks name uniqueness and classification across the whole store.
    pub fn validate(&self) -> IntegrityReport {
        validate(self.store.iter(), &self.category_names)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The catalog's category enumeration.
    pub fn category_names(&self) -> &[String] {
        &self.category_names
    }

    pub fn inverted_index(&self) -> &InvertedIndex {
        &self.inverted
    }

    pub fn category_index(&self) -> &ExactIndex {
        &self.categories
    }

    pub fn tag_index(&self) -> &ExactIndex {
        &self.tags
    }

    pub fn alias_table(&self) -> &AliasTable {
        &self.aliases
    }
}

/// Primary names first, then aliases, so a record's own names take
/// precedence over its aliases.
fn name_claims(record: &IndexableRecord) -> impl Iterator<Item = (&str, NameKind)> {
    record
        .primary_names
        .iter()
        .map(|n| (n.as_str(), NameKind::Primary))
        .chain(record.aliases.iter().map(|a| (a.as_str(), NameKind::Alias)))
}

/// How `record` claims the normalized `name`, if at all.
fn claim_kind(record: &IndexableRecord, name: &str) -> Option<NameKind> {
    name_claims(record)
        .find(|(claimed, _)| normalize_key(claimed) == name)
        .map(|(_, kind)| kind)
}

/// Hands each unowned freed name to the lowest-id record still claiming it.
fn reassign_freed(
    store: &RecordStore,
    aliases: &mut AliasTable,
    freed: BTreeSet<String>,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for name in freed {
        if aliases.resolve(&name).is_some() {
            continue;
        }
        let heir = store
            .iter()
            .find_map(|record| claim_kind(record, &name).map(|kind| (record.id.clone(), kind)));
        if let Some((id, kind)) = heir {
            aliases.claim(&id, [(name.as_str(), kind)]);
            debug!(name = %name, to = %id, "name reassigned");
            diagnostics.push(Diagnostic::NameReassigned { name, to: id });
        }
    }

    diagnostics
}
