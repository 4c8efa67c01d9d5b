//! In-memory record store keyed by [`RecordId`].

use crate::search::{IndexableRecord, RecordId};
use std::collections::BTreeMap;

/// Identifier → record map.
///
/// Upserts always succeed; unknown ids on `get`/`remove` return
/// `None`/`false`. Ordered by id so [`all`](Self::all) and the validator walk
/// records deterministically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordStore {
    records: BTreeMap<RecordId, IndexableRecord>,
}

impl RecordStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or fully replaces the record at `record.id`.
    pub fn upsert(&mut self, record: IndexableRecord) -> &IndexableRecord {
        let id = record.id.clone();
        self.records.insert(id.clone(), record);
        &self.records[&id]
    }

    /// Retrieves a record by id.
    pub fn get(&self, id: &RecordId) -> Option<&IndexableRecord> {
        self.records.get(id)
    }

    /// Removes a record, returning `true` if it existed.
    pub fn remove(&mut self, id: &RecordId) -> bool {
        self.records.remove(id).is_some()
    }

    /// Owned copy of every record in id order.
    ///
    /// Mutating the returned vector never affects the store.
    pub fn all(&self) -> Vec<IndexableRecord> {
        self.records.values().cloned().collect()
    }

    /// Iterates over stored records in id order.
    pub fn iter(&self) -> impl Iterator<Item = &IndexableRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
