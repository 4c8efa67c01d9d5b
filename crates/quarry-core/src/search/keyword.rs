//! Token inverted index for full-text candidate generation.
//!
//! Maps every token produced by the [tokenizer](super::tokenizer) to the set
//! of records whose searchable fields contain it. A reverse map
//! (record → tokens) makes removal proportional to the record's own token
//! count instead of a scan over every bucket.
//!
//! # Update discipline
//!
//! [`reindex`](InvertedIndex::reindex) always removes every existing posting
//! for the record before adding the new ones. There is no diff step, so a
//! record can never keep a posting for text it no longer contains.
//!
//! # Usage
//!
//! ```
//! use quarry_core::search::keyword::InvertedIndex;
//! use quarry_core::search::{IndexableRecord, RecordId};
//!
//! let mut index = InvertedIndex::new();
//! let record = IndexableRecord::new("kb_1").with_field("title", "TRR validation", 10.0);
//! index.reindex(&record, 3);
//!
//! assert!(index.postings("validation").contains(&RecordId::from("kb_1")));
//! assert!(index.postings("missing").is_empty());
//! ```

use super::tokenizer::tokenize_with;
use super::types::{IndexableRecord, RecordId};
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

/// Token → record-id postings with a reverse map for removal.
///
/// Ordered maps keep iteration deterministic, which in turn keeps candidate
/// order (and therefore tie handling) reproducible.
///
/// # Thread Safety
///
/// This type is **not thread-safe** on its own; the engine guards it together
/// with the store (see [`SharedEngine`](super::SharedEngine)).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvertedIndex {
    /// token -> ids of records containing it
    postings: BTreeMap<String, BTreeSet<RecordId>>,
    /// id -> tokens the record was posted under
    tokens_by_id: BTreeMap<RecordId, BTreeSet<String>>,
}

impl InvertedIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds all postings for `record`.
    ///
    /// Every searchable field is tokenized with `min_token_len`; the record id
    /// is posted once per distinct token.
    pub fn reindex(&mut self, record: &IndexableRecord, min_token_len: usize) {
        self.remove(&record.id);

        let tokens: BTreeSet<String> = record
            .fields
            .iter()
            .flat_map(|field| tokenize_with(&field.text, min_token_len))
            .collect();

        if tokens.is_empty() {
            return;
        }

        for token in &tokens {
            self.postings
                .entry(token.clone())
                .or_default()
                .insert(record.id.clone());
        }
        trace!(id = %record.id, tokens = tokens.len(), "reindexed record");
        self.tokens_by_id.insert(record.id.clone(), tokens);
    }

    /// Removes every posting for `id`, pruning buckets left empty.
    ///
    /// Returns `true` if the id had any postings.
    pub fn remove(&mut self, id: &RecordId) -> bool {
        let Some(tokens) = self.tokens_by_id.remove(id) else {
            return false;
        };

        for token in tokens {
            if let Some(ids) = self.postings.get_mut(&token) {
                ids.remove(id);
                if ids.is_empty() {
                    self.postings.remove(&token);
                }
            }
        }
        true
    }

    /// Returns the ids posted under `token` (empty if unseen).
    pub fn postings(&self, token: &str) -> BTreeSet<RecordId> {
        self.postings.get(token).cloned().unwrap_or_default()
    }

    /// Union of postings across `tokens` (OR semantics).
    pub fn union_postings<'a, I>(&self, tokens: I) -> BTreeSet<RecordId>
    where
        I: IntoIterator<Item = &'a str>,
    {
        tokens
            .into_iter()
            .filter_map(|token| self.postings.get(token))
            .flat_map(|ids| ids.iter().cloned())
            .collect()
    }

    /// Tokens the record is currently posted under.
    pub fn tokens_for(&self, id: &RecordId) -> Option<&BTreeSet<String>> {
        self.tokens_by_id.get(id)
    }

    /// Iterates over `(token, ids)` buckets in token order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<RecordId>)> {
        self.postings.iter().map(|(token, ids)| (token.as_str(), ids))
    }

    /// Number of distinct tokens.
    pub fn token_count(&self) -> usize {
        self.postings.len()
    }

    /// Number of records with at least one posting.
    pub fn len(&self) -> usize {
        self.tokens_by_id.len()
    }

    /// Returns `true` if nothing has been indexed.
    pub fn is_empty(&self) -> bool {
        self.tokens_by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, title: &str, body: &str) -> IndexableRecord {
        IndexableRecord::new(id)
            .with_field("title", title, 10.0)
            .with_field("body", body, 5.0)
    }

    #[test]
    fn test_reindex_posts_every_field() {
        let mut index = InvertedIndex::new();
        index.reindex(&record("r1", "Cloud detection", "aws guardduty"), 3);

        for token in ["cloud", "detection", "aws", "guardduty"] {
            assert!(
                index.postings(token).contains(&RecordId::from("r1")),
                "missing posting for {token}"
            );
        }
        assert_eq!(index.len(), 1);
        assert_eq!(index.token_count(), 4);
    }

    #[test]
    fn test_reindex_replaces_old_tokens() {
        let mut index = InvertedIndex::new();
        index.reindex(&record("r1", "old title", "legacy body"), 3);
        index.reindex(&record("r1", "new title", "fresh body"), 3);

        assert!(index.postings("old").is_empty());
        assert!(index.postings("legacy").is_empty());
        assert!(index.postings("new").contains(&RecordId::from("r1")));
        assert!(index.postings("title").contains(&RecordId::from("r1")));
    }

    #[test]
    fn test_reindex_is_idempotent() {
        let r = record("r1", "Idempotent title", "same body");
        let mut once = InvertedIndex::new();
        once.reindex(&r, 3);

        let mut twice = InvertedIndex::new();
        twice.reindex(&r, 3);
        twice.reindex(&r, 3);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_remove_prunes_empty_buckets() {
        let mut index = InvertedIndex::new();
        index.reindex(&record("r1", "shared unique", ""), 3);
        index.reindex(&record("r2", "shared", ""), 3);

        assert!(index.remove(&RecordId::from("r1")));
        assert!(index.postings("unique").is_empty());
        assert_eq!(
            index.postings("shared"),
            BTreeSet::from([RecordId::from("r2")])
        );
        assert!(index.iter().all(|(_, ids)| !ids.is_empty()));
        assert!(!index.remove(&RecordId::from("r1")));
    }

    #[test]
    fn test_union_postings() {
        let mut index = InvertedIndex::new();
        index.reindex(&record("r1", "machine learning", ""), 3);
        index.reindex(&record("r2", "deep learning", ""), 3);
        index.reindex(&record("r3", "machine vision", ""), 3);

        let ids = index.union_postings(["machine", "deep", "unknown"]);
        assert_eq!(ids.len(), 3);

        let ids = index.union_postings(["vision"]);
        assert_eq!(ids, BTreeSet::from([RecordId::from("r3")]));
    }

    #[test]
    fn test_record_without_tokens_not_tracked() {
        let mut index = InvertedIndex::new();
        index.reindex(&record("r1", "a b", "!!"), 3);
        assert!(index.is_empty());
        assert!(index.tokens_for(&RecordId::from("r1")).is_none());
    }
}
