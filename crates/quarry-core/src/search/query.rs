//! Ranked full-text query over a record store and its indices.
//!
//! # Algorithm
//!
//! 1. Blank query → no hits (there is no "match everything" mode)
//! 2. Tokenize the query; union postings across tokens (OR semantics)
//! 3. Drop candidates failing any structured filter
//! 4. Score each survivor from its field texts: a field adds its weight once
//!    per distinct query token it contains
//! 5. Add the phrase bonus when the whole query appears in the record's
//!    highest-weighted field
//! 6. Sort by score (desc), then sort key, then id; truncate
//! 7. Extract one highlight per matched field
//!
//! Filters with malformed values are dropped before the query runs; they
//! never turn into errors.

use super::keyword::InvertedIndex;
use super::secondary::{normalize_key, ExactIndex};
use super::tokenizer::tokenize_with;
use super::types::{Highlight, IndexableRecord, SearchFilters, SearchHit};
use crate::config::{QueryConfig, ELLIPSIS};
use crate::storage::RecordStore;
use chrono::{DateTime, NaiveDate};
use std::cmp::Ordering;
use tracing::{debug, warn};

/// Attribute compared by the author filter.
pub const AUTHOR_ATTRIBUTE: &str = "author";

/// Attribute compared by the date-range filter.
pub const PUBLISHED_ATTRIBUTE: &str = "published";

/// Read-only view over the store and indices needed to answer a query.
pub struct QueryEngine<'a> {
    pub(crate) store: &'a RecordStore,
    pub(crate) inverted: &'a InvertedIndex,
    pub(crate) categories: &'a ExactIndex,
    pub(crate) tags: &'a ExactIndex,
    pub(crate) config: &'a QueryConfig,
}

impl QueryEngine<'_> {
    /// Runs `query` with `filters`, returning at most `config.result_limit` hits.
    pub fn search(&self, query: &str, filters: &SearchFilters) -> Vec<SearchHit> {
        let phrase = query.trim().to_lowercase();
        if phrase.is_empty() {
            return Vec::new();
        }

        let tokens = distinct(tokenize_with(&phrase, self.config.min_token_len));
        if tokens.is_empty() {
            debug!(query, "query produced no tokens");
            return Vec::new();
        }

        let candidates = self.inverted.union_postings(tokens.iter().map(String::as_str));
        let filters = ActiveFilters::parse(filters);

        let mut hits: Vec<SearchHit> = candidates
            .iter()
            .filter_map(|id| self.store.get(id))
            .filter(|record| filters.matches(record, self.categories, self.tags))
            .filter_map(|record| self.score(record, &tokens, &phrase))
            .collect();

        let candidate_count = hits.len();
        rank_hits(&mut hits);
        hits.truncate(self.config.result_limit);

        for hit in &mut hits {
            hit.highlights = extract_highlights(
                &hit.record,
                &hit.matched_fields,
                &tokens,
                self.config.context_chars,
            );
        }

        debug!(
            query,
            tokens = tokens.len(),
            candidates = candidates.len(),
            scored = candidate_count,
            returned = hits.len(),
            "search complete"
        );
        hits
    }

    fn score(
        &self,
        record: &IndexableRecord,
        tokens: &[String],
        phrase: &str,
    ) -> Option<SearchHit> {
        let mut score = 0.0f32;
        let mut matched_fields: Vec<String> = Vec::new();

        for field in &record.fields {
            let text = field.text.to_lowercase();
            let hits = tokens
                .iter()
                .filter(|token| text.contains(token.as_str()))
                .count();
            if hits > 0 {
                score += field.weight * hits as f32;
                if !matched_fields.contains(&field.tag) {
                    matched_fields.push(field.tag.clone());
                }
            }
        }

        if score <= 0.0 {
            return None;
        }

        if record
            .top_field()
            .is_some_and(|field| field.text.to_lowercase().contains(phrase))
        {
            score += self.config.phrase_bonus;
        }

        Some(SearchHit {
            record: record.clone(),
            score,
            matched_fields,
            highlights: Vec::new(),
        })
    }
}

/// Sorts hits by score (desc), then sort key, then id, for stable output.
pub(crate) fn rank_hits(hits: &mut [SearchHit]) {
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.record.sort_key().cmp(&b.record.sort_key()))
            .then_with(|| a.record.id.cmp(&b.record.id))
    });
}

fn distinct(tokens: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(tokens.len());
    for token in tokens {
        if !seen.contains(&token) {
            seen.push(token);
        }
    }
    seen
}

// =============================================================================
// Filters
// =============================================================================

/// Filters that survived validation.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct ActiveFilters {
    category: Option<String>,
    tags: Vec<String>,
    author: Option<String>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

impl ActiveFilters {
    pub(crate) fn parse(filters: &SearchFilters) -> Self {
        let category = non_blank(filters.category.as_deref());
        let author = non_blank(filters.author.as_deref());
        let tags = filters
            .tags
            .iter()
            .map(|t| normalize_key(t))
            .filter(|t| !t.is_empty())
            .collect();

        let mut from = parse_bound("published_from", filters.published_from.as_deref());
        let mut to = parse_bound("published_to", filters.published_to.as_deref());
        if let (Some(f), Some(t)) = (from, to) {
            if f > t {
                warn!(from = %f, to = %t, "inverted date range, ignoring filter");
                from = None;
                to = None;
            }
        }

        Self {
            category,
            tags,
            author,
            from,
            to,
        }
    }

    pub(crate) fn matches(
        &self,
        record: &IndexableRecord,
        categories: &ExactIndex,
        tags: &ExactIndex,
    ) -> bool {
        if let Some(category) = &self.category {
            if !categories.contains(category, &record.id) {
                return false;
            }
        }

        if !self.tags.iter().all(|tag| tags.contains(tag, &record.id)) {
            return false;
        }

        if let Some(author) = &self.author {
            let matches = record
                .attribute_text(AUTHOR_ATTRIBUTE)
                .is_some_and(|a| normalize_key(a) == *author);
            if !matches {
                return false;
            }
        }

        if self.from.is_some() || self.to.is_some() {
            let published = record
                .attribute_text(PUBLISHED_ATTRIBUTE)
                .and_then(parse_date);
            let Some(published) = published else {
                return false;
            };
            let too_early = self.from.is_some_and(|from| published < from);
            let too_late = self.to.is_some_and(|to| published > to);
            if too_early || too_late {
                return false;
            }
        }

        true
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(normalize_key).filter(|v| !v.is_empty())
}

fn parse_bound(name: &str, value: Option<&str>) -> Option<NaiveDate> {
    let raw = value?.trim();
    if raw.is_empty() {
        return None;
    }
    let parsed = parse_date(raw);
    if parsed.is_none() {
        warn!(filter = name, value = raw, "unparseable date filter, ignoring");
    }
    parsed
}

/// Parses `YYYY-MM-DD` or an RFC 3339 timestamp into a calendar date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

// =============================================================================
// Highlights
// =============================================================================

/// Lowercased text with a map from lowercase byte offsets back to the source.
struct LoweredText {
    lower: String,
    origin: Vec<usize>,
}

impl LoweredText {
    fn new(text: &str) -> Self {
        let mut lower = String::with_capacity(text.len());
        let mut origin = Vec::with_capacity(text.len());
        for (idx, c) in text.char_indices() {
            for lc in c.to_lowercase() {
                let before = lower.len();
                lower.push(lc);
                origin.resize(origin.len() + (lower.len() - before), idx);
            }
        }
        Self { lower, origin }
    }

    fn to_source(&self, lower_pos: usize, source_len: usize) -> usize {
        self.origin.get(lower_pos).copied().unwrap_or(source_len)
    }
}

/// Finds the earliest case-insensitive occurrence of any token in `text`.
///
/// Returns the byte range in `text`. On equal positions the longer token wins.
fn find_earliest(text: &str, tokens: &[String]) -> Option<(usize, usize)> {
    let lowered = LoweredText::new(text);
    tokens
        .iter()
        .filter_map(|token| {
            lowered
                .lower
                .find(token.as_str())
                .map(|pos| (pos, pos + token.len()))
        })
        .min_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))
        .map(|(start, end)| {
            (
                lowered.to_source(start, text.len()),
                lowered.to_source(end, text.len()),
            )
        })
}

/// Builds a snippet around `text[start..end]` with `context` chars on each side.
pub(crate) fn snippet_around(text: &str, start: usize, end: usize, context: usize) -> String {
    let boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    let char_count = boundaries.len();

    let first = boundaries.partition_point(|&b| b < start);
    let last = boundaries.partition_point(|&b| b < end);

    let lo = first.saturating_sub(context);
    let hi = (last + context).min(char_count);

    let byte_lo = boundaries.get(lo).copied().unwrap_or(text.len());
    let byte_hi = boundaries.get(hi).copied().unwrap_or(text.len());

    let mut snippet = String::new();
    if lo > 0 {
        snippet.push_str(ELLIPSIS);
    }
    snippet.push_str(text[byte_lo..byte_hi].trim());
    if hi < char_count {
        snippet.push_str(ELLIPSIS);
    }
    snippet
}

/// One highlight per matched field, in field order.
pub(crate) fn extract_highlights(
    record: &IndexableRecord,
    matched_fields: &[String],
    tokens: &[String],
    context: usize,
) -> Vec<Highlight> {
    matched_fields
        .iter()
        .filter_map(|tag| {
            let field = record.fields.iter().find(|f| &f.tag == tag)?;
            let (start, end) = find_earliest(&field.text, tokens)?;
            Some(Highlight {
                field: tag.clone(),
                snippet: snippet_around(&field.text, start, end, context),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::types::RecordId;

    #[test]
    fn test_snippet_unclipped_when_short() {
        let text = "TRR Validation Best Practices";
        assert_eq!(snippet_around(text, 4, 14, 50), text);
    }

    #[test]
    fn test_snippet_clipped_both_sides() {
        let text = format!("{}needle{}", "x".repeat(80), "y".repeat(80));
        let snippet = snippet_around(&text, 80, 86, 10);
        assert_eq!(snippet, format!("...{}needle{}...", "x".repeat(10), "y".repeat(10)));
    }

    #[test]
    fn test_snippet_clipped_at_end_only() {
        let text = format!("needle {}", "z".repeat(100));
        let snippet = snippet_around(&text, 0, 6, 5);
        assert!(snippet.starts_with("needle"));
        assert!(snippet.ends_with(ELLIPSIS));
    }

    #[test]
    fn test_snippet_respects_char_boundaries() {
        let text = "ééééé needle ééééé";
        let start = text.find("needle").unwrap();
        let snippet = snippet_around(text, start, start + 6, 3);
        assert_eq!(snippet, "...éé needle éé...");
    }

    #[test]
    fn test_find_earliest_case_insensitive() {
        let text = "Cloud Detection for AWS";
        let tokens = vec!["aws".to_string(), "detection".to_string()];
        assert_eq!(find_earliest(text, &tokens), Some((6, 15)));
    }

    #[test]
    fn test_find_earliest_maps_back_through_expanding_lowercase() {
        // 'İ' lowercases to two chars; offsets must still land on the source text
        let text = "İstanbul cloud";
        let tokens = vec!["cloud".to_string()];
        let (start, end) = find_earliest(text, &tokens).unwrap();
        assert_eq!(&text[start..end], "cloud");
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-03-01"), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(
            parse_date("2024-03-01T10:00:00Z"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(parse_date("March 1st"), None);
    }

    #[test]
    fn test_malformed_filters_dropped() {
        let filters = SearchFilters {
            category: Some("   ".to_string()),
            tags: vec!["".to_string(), "Cloud".to_string()],
            author: None,
            published_from: Some("not-a-date".to_string()),
            published_to: Some("2024-12-31".to_string()),
        };
        let active = ActiveFilters::parse(&filters);
        assert_eq!(active.category, None);
        assert_eq!(active.tags, vec!["cloud".to_string()]);
        assert_eq!(active.from, None);
        assert_eq!(active.to, NaiveDate::from_ymd_opt(2024, 12, 31));
    }

    #[test]
    fn test_inverted_range_dropped() {
        let filters = SearchFilters::default().published_between("2024-12-31", "2024-01-01");
        let active = ActiveFilters::parse(&filters);
        assert_eq!(active, ActiveFilters::default());
    }

    #[test]
    fn test_filter_matching() {
        let id = RecordId::from("kb1");
        let record = IndexableRecord::new("kb1")
            .with_attribute("author", "Dana Reyes")
            .with_attribute("published", "2024-06-15");
        let mut categories = ExactIndex::new();
        categories.reindex(&id, ["Scenarios"]);
        let mut tags = ExactIndex::new();
        tags.reindex(&id, ["cloud", "aws"]);

        let pass = ActiveFilters::parse(
            &SearchFilters::default()
                .category("scenarios")
                .tag("AWS")
                .author("dana reyes")
                .published_between("2024-01-01", "2024-12-31"),
        );
        assert!(pass.matches(&record, &categories, &tags));

        let wrong_tag = ActiveFilters::parse(&SearchFilters::default().tag("azure"));
        assert!(!wrong_tag.matches(&record, &categories, &tags));

        let too_early = ActiveFilters::parse(&SearchFilters {
            published_to: Some("2024-01-01".to_string()),
            ..SearchFilters::default()
        });
        assert!(!too_early.matches(&record, &categories, &tags));
    }

    #[test]
    fn test_date_filter_rejects_records_without_date() {
        let record = IndexableRecord::new("c1");
        let active = ActiveFilters::parse(&SearchFilters {
            published_from: Some("2024-01-01".to_string()),
            ..SearchFilters::default()
        });
        assert!(!active.matches(&record, &ExactIndex::new(), &ExactIndex::new()));
    }
}
