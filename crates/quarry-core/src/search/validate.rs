//! Registry integrity validation.
//!
//! Walks the store once (in id order) and reports:
//! - primary names claimed by more than one record
//! - aliases claimed by more than one record, or colliding with a primary name
//! - records whose category is missing or outside the catalog's enumeration
//!
//! The walk reads the store, not the alias table: the table only holds the
//! winning mapping for each name, while the store still carries every
//! record's full claim list.

use super::secondary::normalize_key;
use super::types::{IndexableRecord, IntegrityReport};
use std::collections::BTreeSet;

/// Validates `records` against the closed `categories` enumeration.
///
/// Never fails; an empty corpus yields a valid, empty report.
pub fn validate<'a, I>(records: I, categories: &[String]) -> IntegrityReport
where
    I: IntoIterator<Item = &'a IndexableRecord>,
{
    let allowed: BTreeSet<String> = categories.iter().map(|c| normalize_key(c)).collect();

    let mut seen_names: BTreeSet<String> = BTreeSet::new();
    let mut seen_aliases: BTreeSet<String> = BTreeSet::new();
    let mut duplicate_names: BTreeSet<String> = BTreeSet::new();
    let mut duplicate_aliases: BTreeSet<String> = BTreeSet::new();
    let mut missing_classification = Vec::new();

    for record in records {
        let names: BTreeSet<String> = normalized(&record.primary_names);
        // an alias repeating the record's own primary name is not a collision
        let aliases: BTreeSet<String> = normalized(&record.aliases)
            .into_iter()
            .filter(|alias| !names.contains(alias))
            .collect();

        for name in &names {
            if seen_names.contains(name) || seen_aliases.contains(name) {
                duplicate_names.insert(name.clone());
            }
        }
        for alias in &aliases {
            if seen_aliases.contains(alias) || seen_names.contains(alias) {
                duplicate_aliases.insert(alias.clone());
            }
        }
        seen_names.extend(names);
        seen_aliases.extend(aliases);

        let classified = record
            .category
            .as_deref()
            .map(normalize_key)
            .is_some_and(|c| !c.is_empty() && allowed.contains(&c));
        if !classified {
            missing_classification.push(record.id.clone());
        }
    }

    missing_classification.sort();
    missing_classification.dedup();

    IntegrityReport {
        is_valid: duplicate_names.is_empty()
            && duplicate_aliases.is_empty()
            && missing_classification.is_empty(),
        duplicate_names: duplicate_names.into_iter().collect(),
        duplicate_aliases: duplicate_aliases.into_iter().collect(),
        missing_classification,
    }
}

fn normalized(values: &[String]) -> BTreeSet<String> {
    values
        .iter()
        .map(|v| normalize_key(v))
        .filter(|v| !v.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories() -> Vec<String> {
        vec!["system".to_string(), "pov".to_string()]
    }

    #[test]
    fn test_empty_corpus_is_valid() {
        let report = validate(std::iter::empty(), &categories());
        assert_eq!(
            report,
            IntegrityReport {
                is_valid: true,
                ..IntegrityReport::default()
            }
        );
    }

    #[test]
    fn test_duplicate_alias_reported() {
        let a = IndexableRecord::new("a")
            .with_name("help")
            .with_category("system");
        let b = IndexableRecord::new("b")
            .with_name("assist")
            .with_alias("Help")
            .with_category("system");
        let c = IndexableRecord::new("c")
            .with_alias("faq")
            .with_category("system");
        let d = IndexableRecord::new("d")
            .with_alias("FAQ")
            .with_category("system");

        let report = validate([&a, &b, &c, &d], &categories());
        assert!(!report.is_valid);
        assert_eq!(report.duplicate_aliases, vec!["faq".to_string(), "help".to_string()]);
        assert!(report.duplicate_names.is_empty());
    }

    #[test]
    fn test_duplicate_primary_name_reported() {
        let a = IndexableRecord::new("a")
            .with_name("POV")
            .with_category("pov");
        let b = IndexableRecord::new("b")
            .with_name("pov")
            .with_category("pov");

        let report = validate([&a, &b], &categories());
        assert_eq!(report.duplicate_names, vec!["pov".to_string()]);
    }

    #[test]
    fn test_own_alias_matching_own_name_ignored() {
        let a = IndexableRecord::new("a")
            .with_name("clear")
            .with_alias("CLEAR")
            .with_category("system");
        let report = validate([&a], &categories());
        assert!(report.is_valid);
    }

    #[test]
    fn test_missing_or_unknown_category() {
        let ok = IndexableRecord::new("ok").with_category("System");
        let missing = IndexableRecord::new("missing");
        let unknown = IndexableRecord::new("unknown").with_category("weather");
        let blank = IndexableRecord::new("blank").with_category("  ");

        let report = validate([&ok, &missing, &unknown, &blank], &categories());
        let ids: Vec<&str> = report
            .missing_classification
            .iter()
            .map(|id| id.as_str())
            .collect();
        assert_eq!(ids, vec!["blank", "missing", "unknown"]);
        assert!(!report.is_valid);
    }
}
