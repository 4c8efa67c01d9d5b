//! Exact-match secondary indices.
//!
//! - [`ExactIndex`]: value → ids, used twice by the engine (category, tag).
//!   Same remove-then-add discipline as the inverted index, but keyed by the
//!   whole normalized value instead of tokens.
//! - [`AliasTable`]: name → exactly one id, covering primary names and
//!   aliases. The first record to claim a name keeps it; later claims are
//!   rejected and reported as [`Diagnostic::NameConflict`].

use super::types::{Diagnostic, NameKind, RecordId};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Normalizes an exact-match key: trimmed and lowercased.
pub fn normalize_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Exact value → ids index with a reverse map for removal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExactIndex {
    buckets: BTreeMap<String, BTreeSet<RecordId>>,
    values_by_id: BTreeMap<RecordId, BTreeSet<String>>,
}

impl ExactIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every entry for `id` with `values` (normalized, blanks skipped).
    pub fn reindex<'a, I>(&mut self, id: &RecordId, values: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.remove(id);

        let values: BTreeSet<String> = values
            .into_iter()
            .map(normalize_key)
            .filter(|v| !v.is_empty())
            .collect();
        if values.is_empty() {
            return;
        }

        for value in &values {
            self.buckets.entry(value.clone()).or_default().insert(id.clone());
        }
        self.values_by_id.insert(id.clone(), values);
    }

    /// Removes `id` from every bucket, pruning empty buckets.
    pub fn remove(&mut self, id: &RecordId) -> bool {
        let Some(values) = self.values_by_id.remove(id) else {
            return false;
        };
        for value in values {
            if let Some(ids) = self.buckets.get_mut(&value) {
                ids.remove(id);
                if ids.is_empty() {
                    self.buckets.remove(&value);
                }
            }
        }
        true
    }

    /// Ids filed under `value` (matched case-insensitively).
    pub fn ids(&self, value: &str) -> Option<&BTreeSet<RecordId>> {
        self.buckets.get(&normalize_key(value))
    }

    /// Returns `true` if `id` is filed under `value`.
    pub fn contains(&self, value: &str, id: &RecordId) -> bool {
        self.ids(value).is_some_and(|ids| ids.contains(id))
    }

    /// Iterates over `(value, ids)` buckets in value order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<RecordId>)> {
        self.buckets.iter().map(|(value, ids)| (value.as_str(), ids))
    }

    /// Number of distinct values.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Case-insensitive name → id resolution table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    owners: BTreeMap<String, RecordId>,
    names_by_id: BTreeMap<RecordId, BTreeSet<String>>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `names` for `id`.
    ///
    /// Names already owned by another id are left untouched and reported.
    /// Re-claiming a name the id already owns is a no-op.
    pub fn claim<'a, I>(&mut self, id: &RecordId, names: I) -> Vec<Diagnostic>
    where
        I: IntoIterator<Item = (&'a str, NameKind)>,
    {
        let mut diagnostics = Vec::new();

        for (raw, kind) in names {
            let name = normalize_key(raw);
            if name.is_empty() {
                continue;
            }
            match self.owners.get(&name) {
                None => {
                    self.owners.insert(name.clone(), id.clone());
                    self.names_by_id.entry(id.clone()).or_default().insert(name);
                }
                Some(owner) if owner == id => {}
                Some(owner) => {
                    warn!(
                        name = %name,
                        owner = %owner,
                        rejected = %id,
                        "name conflict, keeping first owner"
                    );
                    diagnostics.push(Diagnostic::NameConflict {
                        name,
                        name_kind: kind,
                        owner: owner.clone(),
                        rejected: id.clone(),
                    });
                }
            }
        }

        diagnostics
    }

    /// Releases every name owned by `id`, returning the freed names.
    pub fn release(&mut self, id: &RecordId) -> BTreeSet<String> {
        let names = self.names_by_id.remove(id).unwrap_or_default();
        for name in &names {
            self.owners.remove(name);
        }
        names
    }

    /// Resolves `name` (case-insensitive) to its owner.
    pub fn resolve(&self, name: &str) -> Option<&RecordId> {
        self.owners.get(&normalize_key(name))
    }

    /// Names currently owned by `id`.
    pub fn names_for(&self, id: &RecordId) -> Option<&BTreeSet<String>> {
        self.names_by_id.get(id)
    }

    /// Iterates over `(name, owner)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RecordId)> {
        self.owners.iter().map(|(name, id)| (name.as_str(), id))
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
