//! Output formatting for command results.
//!
//! Supports both human-readable terminal output and JSON for scripting.

use quarry_core::search::{IndexableRecord, IntegrityReport, RecordId, Recommendation, SearchHit};
use serde::Serialize;

/// Maximum characters to show for a field value
const SNIPPET_MAX_LEN: usize = 200;

/// JSON output structure for search results
#[derive(Serialize)]
pub struct JsonSearchOutput<'a> {
    pub query: &'a str,
    pub results: Vec<JsonHit<'a>>,
}

/// Single search hit in JSON format
#[derive(Serialize)]
pub struct JsonHit<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub category: Option<&'a str>,
    pub score: f32,
    pub matched_fields: &'a [String],
    pub highlights: Vec<JsonHighlight<'a>>,
}

#[derive(Serialize)]
pub struct JsonHighlight<'a> {
    pub field: &'a str,
    pub snippet: &'a str,
}

impl<'a> From<&'a SearchHit> for JsonHit<'a> {
    fn from(hit: &'a SearchHit) -> Self {
        Self {
            id: hit.record.id.as_str(),
            title: hit.record.display_title(),
            category: hit.record.category.as_deref(),
            score: hit.score,
            matched_fields: &hit.matched_fields,
            highlights: hit
                .highlights
                .iter()
                .map(|h| JsonHighlight {
                    field: &h.field,
                    snippet: &h.snippet,
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct JsonResolveOutput<'a> {
    name: &'a str,
    record: Option<&'a IndexableRecord>,
}

#[derive(Serialize)]
struct JsonRecommendOutput<'a> {
    id: &'a str,
    recommendations: Vec<JsonRecommendation<'a>>,
}

#[derive(Serialize)]
struct JsonRecommendation<'a> {
    id: &'a str,
    title: &'a str,
    score: f32,
}

#[derive(Serialize)]
struct JsonReportOutput<'a> {
    catalog: &'a str,
    #[serde(flatten)]
    report: &'a IntegrityReport,
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

// =============================================================================
// Search
// =============================================================================

/// Formats search results as JSON.
pub fn format_search_json(query: &str, hits: &[SearchHit]) -> String {
    to_json(&JsonSearchOutput {
        query,
        results: hits.iter().map(JsonHit::from).collect(),
    })
}

/// Formats search results for human-readable terminal output.
pub fn format_search_human(query: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("No results found for \"{}\"", query);
    }

    let mut output = format!(
        "Found {} result{} for \"{}\":\n\n",
        hits.len(),
        plural(hits.len()),
        query
    );

    for (i, hit) in hits.iter().enumerate() {
        output.push_str(&format!(
            "{}. {} (score: {:.2})\n",
            i + 1,
            hit.record.display_title(),
            hit.score
        ));

        let mut meta = vec![format!("id: {}", hit.record.id)];
        if let Some(category) = &hit.record.category {
            meta.push(format!("category: {}", category));
        }
        if !hit.matched_fields.is_empty() {
            meta.push(format!("matched: {}", hit.matched_fields.join(", ")));
        }
        output.push_str(&format!("   [{}]\n", meta.join(", ")));

        for highlight in &hit.highlights {
            output.push_str(&format!(
                "   {}: {}\n",
                highlight.field,
                indent_text(&highlight.snippet, "   ")
            ));
        }
        output.push('\n');
    }

    output.trim_end().to_string()
}

// =============================================================================
// Resolve
// =============================================================================

pub fn format_resolve_json(name: &str, record: Option<&IndexableRecord>) -> String {
    to_json(&JsonResolveOutput { name, record })
}

pub fn format_resolve_human(name: &str, record: Option<&IndexableRecord>) -> String {
    let Some(record) = record else {
        return format!("No record named \"{}\"", name);
    };

    let mut output = format!("{} ({})\n", record.display_title(), record.id);
    if let Some(category) = &record.category {
        output.push_str(&format!("   category: {}\n", category));
    }
    if !record.aliases.is_empty() {
        output.push_str(&format!("   aliases: {}\n", record.aliases.join(", ")));
    }
    if !record.tags.is_empty() {
        output.push_str(&format!("   tags: {}\n", record.tags.join(", ")));
    }
    for field in &record.fields {
        let text = truncate_text(&field.text, SNIPPET_MAX_LEN);
        output.push_str(&format!("   {}: {}\n", field.tag, indent_text(&text, "   ")));
    }

    output.trim_end().to_string()
}

// =============================================================================
// Recommend
// =============================================================================

pub fn format_recommendations_json(id: &RecordId, recommendations: &[Recommendation]) -> String {
    to_json(&JsonRecommendOutput {
        id: id.as_str(),
        recommendations: recommendations
            .iter()
            .map(|r| JsonRecommendation {
                id: r.record.id.as_str(),
                title: r.record.display_title(),
                score: r.score,
            })
            .collect(),
    })
}

pub fn format_recommendations_human(id: &RecordId, recommendations: &[Recommendation]) -> String {
    if recommendations.is_empty() {
        return format!("No related records for {}", id);
    }

    let mut output = format!("Related to {}:\n\n", id);
    for (i, rec) in recommendations.iter().enumerate() {
        output.push_str(&format!(
            "{}. {} ({}, score: {:.2})\n",
            i + 1,
            rec.record.display_title(),
            rec.record.id,
            rec.score
        ));
    }
    output.trim_end().to_string()
}

// =============================================================================
// Validate
// =============================================================================

pub fn format_report_json(catalog: &str, report: &IntegrityReport) -> String {
    to_json(&JsonReportOutput { catalog, report })
}

pub fn format_report_human(catalog: &str, report: &IntegrityReport) -> String {
    if report.is_valid {
        return format!("Catalog \"{}\" is valid", catalog);
    }

    let mut output = format!("Catalog \"{}\" has problems:\n", catalog);
    if !report.duplicate_names.is_empty() {
        output.push_str(&format!(
            "   duplicate names: {}\n",
            report.duplicate_names.join(", ")
        ));
    }
    if !report.duplicate_aliases.is_empty() {
        output.push_str(&format!(
            "   duplicate aliases: {}\n",
            report.duplicate_aliases.join(", ")
        ));
    }
    if !report.missing_classification.is_empty() {
        let ids: Vec<&str> = report
            .missing_classification
            .iter()
            .map(RecordId::as_str)
            .collect();
        output.push_str(&format!("   missing category: {}\n", ids.join(", ")));
    }
    output.trim_end().to_string()
}

// =============================================================================
// Helpers
// =============================================================================

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Truncates text to at most `max_chars` characters, adding an ellipsis if needed.
fn truncate_text(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };

    // Prefer a word boundary
    let truncated = &text[..cut];
    match truncated.rfind(' ') {
        Some(last_space) => format!("{}...", &truncated[..last_space]),
        None => format!("{}...", truncated),
    }
}

/// Indents all lines of text after the first line.
fn indent_text(text: &str, indent: &str) -> String {
    text.lines()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                line.to_string()
            } else {
                format!("{}{}", indent, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
