//! Property tests: index consistency under random upsert/remove sequences.

use proptest::prelude::*;
use proptest::test_runner::Config;
use quarry_core::config::EngineConfig;
use quarry_core::search::secondary::normalize_key;
use quarry_core::search::{
    tokenize, Diagnostic, IndexableRecord, RecordEngine, RecordId, SearchFilters,
};
use std::collections::BTreeSet;

const WORDS: [&str; 8] = ["cloud", "trr", "validation", "ransomware", "pov", "edr", "aws", "azure"];
const CATEGORIES: [&str; 3] = ["Scenarios", "Demos", "Guides"];
const NAMES: [&str; 4] = ["help", "faq", "kb", "docs"];

#[derive(Debug, Clone)]
enum Op {
    Upsert(IndexableRecord),
    Remove(usize),
}

fn words(max: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(WORDS.to_vec()), 0..max).prop_map(|w| w.join(" "))
}

fn record() -> impl Strategy<Value = IndexableRecord> {
    (
        0..6usize,
        words(4),
        words(6),
        prop::option::of(prop::sample::select(CATEGORIES.to_vec())),
        prop::collection::vec(prop::sample::select(WORDS.to_vec()), 0..3),
        prop::collection::vec(prop::sample::select(NAMES.to_vec()), 0..2),
    )
        .prop_map(|(id, title, body, category, tags, aliases)| {
            let mut record = IndexableRecord::new(format!("r{id}"))
                .with_name(format!("r{id}"))
                .with_field("title", title, 10.0)
                .with_field("body", body, 5.0)
                .with_tags(tags);
            record.category = category.map(str::to_string);
            record.aliases = aliases.into_iter().map(str::to_string).collect();
            record
        })
}

fn ops() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![
            3 => record().prop_map(Op::Upsert),
            1 => (0..6usize).prop_map(Op::Remove),
        ],
        1..40,
    )
}

fn apply(ops: &[Op]) -> RecordEngine {
    let mut engine = RecordEngine::new(EngineConfig::default(), CATEGORIES);
    for op in ops {
        match op {
            Op::Upsert(record) => {
                engine.upsert(record.clone());
            }
            Op::Remove(id) => {
                engine.remove(&RecordId::new(format!("r{id}")));
            }
        }
    }
    engine
}

fn record_tokens(record: &IndexableRecord) -> BTreeSet<String> {
    record.fields.iter().flat_map(|f| tokenize(&f.text)).collect()
}

fn claimed_names(record: &IndexableRecord) -> BTreeSet<String> {
    record
        .primary_names
        .iter()
        .chain(record.aliases.iter())
        .map(|n| normalize_key(n))
        .collect()
}

proptest! {
    #![proptest_config(Config::with_cases(128))]

    #[test]
    fn postings_match_store(ops in ops()) {
        let engine = apply(&ops);

        for (token, ids) in engine.inverted_index().iter() {
            prop_assert!(!ids.is_empty(), "empty bucket for {}", token);
            for id in ids {
                let record = engine.get(id);
                prop_assert!(record.is_some(), "dangling posting {} -> {}", token, id);
                prop_assert!(record_tokens(record.unwrap()).contains(token));
            }
        }

        for record in engine.all() {
            for token in record_tokens(&record) {
                prop_assert!(engine.inverted_index().postings(&token).contains(&record.id));
            }
        }
    }

    #[test]
    fn secondary_indices_match_store(ops in ops()) {
        let engine = apply(&ops);

        for (category, ids) in engine.category_index().iter() {
            for id in ids {
                let stored = engine.get(id).and_then(|r| r.category.as_deref()).map(normalize_key);
                prop_assert_eq!(stored.as_deref(), Some(category));
            }
        }
        for (tag, ids) in engine.tag_index().iter() {
            for id in ids {
                let tags: Vec<String> = engine
                    .get(id)
                    .map(|r| r.tags.iter().map(|t| normalize_key(t)).collect())
                    .unwrap_or_default();
                prop_assert!(tags.iter().any(|t| t == tag));
            }
        }
    }

    #[test]
    fn alias_table_points_at_live_claimants(ops in ops()) {
        let engine = apply(&ops);

        for (name, owner) in engine.alias_table().iter() {
            let record = engine.get(owner);
            prop_assert!(record.is_some(), "name {} owned by removed {}", name, owner);
            prop_assert!(claimed_names(record.unwrap()).contains(name));
        }

        // every claimed name resolves to some live claimant
        for record in engine.all() {
            for name in claimed_names(&record) {
                let resolved = engine.resolve_exact(&name);
                prop_assert!(resolved.is_some(), "unresolvable name {}", name);
                prop_assert!(claimed_names(resolved.unwrap()).contains(&name));
            }
        }
    }

    #[test]
    fn reupsert_is_idempotent(ops in ops()) {
        let mut engine = apply(&ops);
        let before = (
            engine.inverted_index().clone(),
            engine.category_index().clone(),
            engine.tag_index().clone(),
            engine.alias_table().clone(),
        );

        for record in engine.all() {
            let outcome = engine.upsert(record);
            let generated = outcome
                .diagnostics
                .iter()
                .any(|d| matches!(d, Diagnostic::IdGenerated { .. }));
            prop_assert!(!generated);
        }

        prop_assert_eq!(engine.inverted_index(), &before.0);
        prop_assert_eq!(engine.category_index(), &before.1);
        prop_assert_eq!(engine.tag_index(), &before.2);
        prop_assert_eq!(engine.alias_table(), &before.3);
    }

    #[test]
    fn indices_equal_fresh_rebuild(ops in ops()) {
        let engine = apply(&ops);
        let rebuilt =
            RecordEngine::from_snapshot(EngineConfig::default(), CATEGORIES, engine.all());

        prop_assert_eq!(engine.inverted_index(), rebuilt.inverted_index());
        prop_assert_eq!(engine.category_index(), rebuilt.category_index());
        prop_assert_eq!(engine.tag_index(), rebuilt.tag_index());
    }

    #[test]
    fn removal_leaves_no_trace(ops in ops(), victim in 0..6usize) {
        let mut engine = apply(&ops);
        let id = RecordId::new(format!("r{victim}"));
        engine.remove(&id);

        prop_assert!(engine.get(&id).is_none());
        prop_assert!(engine.inverted_index().iter().all(|(_, ids)| !ids.contains(&id)));
        prop_assert!(engine.category_index().iter().all(|(_, ids)| !ids.contains(&id)));
        prop_assert!(engine.tag_index().iter().all(|(_, ids)| !ids.contains(&id)));
        prop_assert!(engine.alias_table().iter().all(|(_, owner)| owner != &id));

        for word in WORDS {
            let hits = engine.search(word, &SearchFilters::default());
            prop_assert!(hits.iter().all(|h| h.record.id != id));
        }
    }

    #[test]
    fn search_is_deterministic(ops in ops(), a in 0..8usize, b in 0..8usize) {
        let engine = apply(&ops);
        let query = format!("{} {}", WORDS[a], WORDS[b]);

        let first = engine.search(&query, &SearchFilters::default());
        let second = engine.clone().search(&query, &SearchFilters::default());
        prop_assert_eq!(&first, &second);

        for pair in first.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
    }
}
