//! Knowledge base catalog.

use super::{joined, CatalogKind};
use crate::config::{BODY_WEIGHT, SUMMARY_WEIGHT, TAGS_WEIGHT, TITLE_WEIGHT};
use crate::search::query::{AUTHOR_ATTRIBUTE, PUBLISHED_ATTRIBUTE};
use crate::search::recommend::{popularity_from_count, POPULARITY_ATTRIBUTE, RATING_ATTRIBUTE};
use crate::search::IndexableRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum KnowledgeCategory {
    #[serde(rename = "Best Practices")]
    BestPractices,
    Scenarios,
    Troubleshooting,
    Playbooks,
    Reference,
}

impl KnowledgeCategory {
    pub const ALL: [KnowledgeCategory; 5] = [
        KnowledgeCategory::BestPractices,
        KnowledgeCategory::Scenarios,
        KnowledgeCategory::Troubleshooting,
        KnowledgeCategory::Playbooks,
        KnowledgeCategory::Reference,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            KnowledgeCategory::BestPractices => "Best Practices",
            KnowledgeCategory::Scenarios => "Scenarios",
            KnowledgeCategory::Troubleshooting => "Troubleshooting",
            KnowledgeCategory::Playbooks => "Playbooks",
            KnowledgeCategory::Reference => "Reference",
        }
    }
}

/// A knowledge base article. Articles resolve exactly by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeArticle {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub content: String,
    pub category: KnowledgeCategory,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub published: Option<NaiveDate>,
    #[serde(default)]
    pub views: u64,
    /// Reader rating, 0.0 to 5.0
    #[serde(default)]
    pub rating: Option<f64>,
}

impl From<KnowledgeArticle> for IndexableRecord {
    fn from(article: KnowledgeArticle) -> Self {
        let mut record = IndexableRecord::new(article.id.clone())
            .with_field("title", article.title, TITLE_WEIGHT)
            .with_category(article.category.as_str());

        if !article.id.trim().is_empty() {
            record = record.with_name(article.id);
        }
        if !article.tags.is_empty() {
            record = record.with_field("tags", joined(&article.tags), TAGS_WEIGHT);
        }
        if !article.summary.is_empty() {
            record = record.with_field("summary", article.summary, SUMMARY_WEIGHT);
        }
        if !article.content.is_empty() {
            record = record.with_field("content", article.content, BODY_WEIGHT);
        }

        if let Some(author) = article.author {
            record = record.with_attribute(AUTHOR_ATTRIBUTE, author);
        }
        if let Some(published) = article.published {
            let published = published.format("%Y-%m-%d").to_string();
            record = record.with_attribute(PUBLISHED_ATTRIBUTE, published);
        }
        if let Some(rating) = article.rating {
            record = record.with_attribute(RATING_ATTRIBUTE, rating);
        }
        if article.views > 0 {
            let popularity = popularity_from_count(article.views);
            record = record.with_attribute(POPULARITY_ATTRIBUTE, popularity);
        }

        record.with_tags(article.tags)
    }
}

/// The knowledge base catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct KnowledgeBase;

impl CatalogKind for KnowledgeBase {
    type Item = KnowledgeArticle;
    const NAME: &'static str = "knowledge";

    fn categories() -> Vec<String> {
        KnowledgeCategory::ALL.iter().map(|c| c.as_str().to_string()).collect()
    }

    fn default_corpus() -> Vec<KnowledgeArticle> {
        use KnowledgeCategory::*;

        vec![
            article(
                "kb_trr_001",
                "TRR Validation Best Practices",
                BestPractices,
                &["trr", "validation", "best-practices"],
                "How to gather evidence and sign off a technical review request.",
                "Every TRR should map to one POV success criterion. Capture the detection \
                 output, the raw telemetry and the reviewer's notes before marking a TRR as \
                 validated. Reject requests whose evidence cannot be reproduced in the lab.",
                ("Dana Reyes", "2024-02-12", 1840, 4.8),
            ),
            article(
                "kb_pov_001",
                "Planning a Proof-of-Value Engagement",
                BestPractices,
                &["pov", "planning", "engagement"],
                "Scoping success criteria and timelines for a POV.",
                "Agree on three to five measurable success criteria with the customer before \
                 the kickoff call. Each criterion needs an owner, a data source and a target date.",
                ("Lee Park", "2023-09-04", 2310, 4.6),
            ),
            article(
                "kb_cloud_001",
                "Detecting Credential Abuse in Cloud Accounts",
                Scenarios,
                &["cloud", "aws", "identity", "detection"],
                "Walkthrough of the valid-accounts scenario for AWS and Azure tenants.",
                "Simulate console logins from unusual geographies, then pivot into access key \
                 creation. Correlate CloudTrail events with identity provider sign-ins to \
                 surface the abuse chain.",
                ("Priya Nair", "2024-05-21", 1275, 4.7),
            ),
            article(
                "kb_edr_001",
                "Troubleshooting Missing EDR Telemetry",
                Troubleshooting,
                &["edr", "telemetry", "agents"],
                "Checklist for agents that stop reporting during a POV.",
                "Confirm the agent service is running, check proxy allow lists, and verify the \
                 sensor policy has not excluded the lab hosts. Collect agent logs before \
                 reinstalling.",
                ("Lee Park", "2024-01-18", 960, 4.2),
            ),
            article(
                "kb_ir_001",
                "Ransomware Response Playbook",
                Playbooks,
                &["ransomware", "incident-response", "containment"],
                "Containment and recovery steps for a ransomware outbreak.",
                "Isolate affected hosts, preserve volatile evidence, disable compromised \
                 accounts and restore from known-good backups. Brief stakeholders every hour \
                 until containment is confirmed.",
                ("Priya Nair", "2023-11-30", 3120, 4.9),
            ),
            article(
                "kb_ref_001",
                "Portal Command Reference",
                Reference,
                &["commands", "terminal", "reference"],
                "Every terminal command with usage and examples.",
                "Use help for an overview, goto to switch sections, and kb-search to find \
                 articles. Commands accept aliases listed in their help entry.",
                ("Dana Reyes", "2024-06-03", 780, 4.1),
            ),
            article(
                "kb_trr_002",
                "Common TRR Rejection Reasons",
                Troubleshooting,
                &["trr", "review", "evidence"],
                "Why technical reviews get sent back and how to avoid it.",
                "Most rejections come from missing screenshots, detections that fired outside \
                 the agreed window, or evidence collected on hosts outside the POV scope.",
                ("Dana Reyes", "2024-03-27", 1105, 4.4),
            ),
        ]
    }
}

fn article(
    id: &str,
    title: &str,
    category: KnowledgeCategory,
    tags: &[&str],
    summary: &str,
    content: &str,
    (author, published, views, rating): (&str, &str, u64, f64),
) -> KnowledgeArticle {
    KnowledgeArticle {
        id: id.to_string(),
        title: title.to_string(),
        summary: summary.to_string(),
        content: content.to_string(),
        category,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        author: Some(author.to_string()),
        published: NaiveDate::parse_from_str(published, "%Y-%m-%d").ok(),
        views,
        rating: Some(rating),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::validate::validate;

    #[test]
    fn test_category_serde_uses_display_names() {
        let json = serde_json::to_string(&KnowledgeCategory::BestPractices).unwrap();
        assert_eq!(json, "\"Best Practices\"");
        let back: KnowledgeCategory = serde_json::from_str("\"Playbooks\"").unwrap();
        assert_eq!(back, KnowledgeCategory::Playbooks);
    }

    #[test]
    fn test_article_conversion() {
        let record: IndexableRecord = KnowledgeBase::default_corpus().remove(0).into();

        assert_eq!(record.id.as_str(), "kb_trr_001");
        assert_eq!(record.primary_names, vec!["kb_trr_001".to_string()]);
        assert_eq!(record.category.as_deref(), Some("Best Practices"));
        assert_eq!(record.attribute_text("published"), Some("2024-02-12"));
        assert_eq!(record.attribute_text("author"), Some("Dana Reyes"));
        assert_eq!(record.attribute_number("rating"), Some(4.8));
        assert_eq!(record.top_field().map(|f| f.tag.as_str()), Some("title"));
    }

    #[test]
    fn test_article_deserializes_with_defaults() {
        let json = r#"{"id":"kb_x","title":"Minimal","category":"Reference"}"#;
        let article: KnowledgeArticle = serde_json::from_str(json).unwrap();
        assert!(article.tags.is_empty());
        assert_eq!(article.published, None);
    }

    #[test]
    fn test_default_corpus_is_valid() {
        let records: Vec<IndexableRecord> = KnowledgeBase::default_corpus()
            .into_iter()
            .map(Into::into)
            .collect();
        assert!(records.iter().all(|r| r.attribute_text("published").is_some()));
        let report = validate(&records, &KnowledgeBase::categories());
        assert!(report.is_valid, "{report:?}");
    }
}
