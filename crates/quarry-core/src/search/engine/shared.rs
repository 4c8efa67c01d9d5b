//! Lock-guarded engine handle.

use super::RecordEngine;
use crate::search::types::{
    IndexableRecord, IntegrityReport, RecordId, RecordPatch, Recommendation, SearchFilters,
    SearchHit, UpsertOutcome,
};
use crate::storage::Snapshot;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Cloneable handle to one [`RecordEngine`] behind a single reader-writer lock.
///
/// Writers hold the write lock for the whole remove-then-add sequence, so a
/// reader never observes a half-rebuilt index. Clones share the same engine.
///
/// Engine operations never panic mid-mutation, so a poisoned lock still
/// guards consistent data and is recovered rather than reported.
#[derive(Debug, Clone)]
pub struct SharedEngine {
    inner: Arc<RwLock<RecordEngine>>,
}

impl SharedEngine {
    pub fn new(engine: RecordEngine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    /// Acquires the read lock.
    pub fn read(&self) -> RwLockReadGuard<'_, RecordEngine> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquires the write lock.
    pub fn write(&self) -> RwLockWriteGuard<'_, RecordEngine> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn upsert(&self, record: IndexableRecord) -> UpsertOutcome {
        self.write().upsert(record)
    }

    /// Upserts every record under one write lock.
    pub fn upsert_batch(&self, records: Vec<IndexableRecord>) -> Vec<UpsertOutcome> {
        self.write().upsert_batch(records)
    }

    pub fn update(&self, id: &RecordId, patch: RecordPatch) -> Option<UpsertOutcome> {
        self.write().update(id, patch)
    }

    pub fn remove(&self, id: &RecordId) -> bool {
        self.write().remove(id)
    }

    pub fn get(&self, id: &RecordId) -> Option<IndexableRecord> {
        self.read().get(id).cloned()
    }

    pub fn all(&self) -> Vec<IndexableRecord> {
        self.read().all()
    }

    pub fn export(&self, catalog: &str) -> Snapshot {
        self.read().export(catalog)
    }

    pub fn resolve_exact(&self, name: &str) -> Option<IndexableRecord> {
        self.read().resolve_exact(name).cloned()
    }

    pub fn search(&self, query: &str, filters: &SearchFilters) -> Vec<SearchHit> {
        self.read().search(query, filters)
    }

    pub fn search_with_limit(
        &self,
        query: &str,
        filters: &SearchFilters,
        limit: usize,
    ) -> Vec<SearchHit> {
        self.read().search_with_limit(query, filters, limit)
    }

    pub fn recommend_for(&self, id: &RecordId, limit: usize) -> Vec<Recommendation> {
        self.read().recommend_for(id, limit)
    }

    pub fn validate(&self) -> IntegrityReport {
        self.read().validate()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
