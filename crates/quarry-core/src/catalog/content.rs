//! Content library catalog: scenarios, demos, templates and datasets.

use super::{joined, CatalogKind, Difficulty};
use crate::config::{BODY_WEIGHT, SUMMARY_WEIGHT, TAGS_WEIGHT, TITLE_WEIGHT};
use crate::search::query::{AUTHOR_ATTRIBUTE, PUBLISHED_ATTRIBUTE};
use crate::search::recommend::{
    popularity_from_count, DIFFICULTY_ATTRIBUTE, PLATFORMS_ATTRIBUTE, POPULARITY_ATTRIBUTE,
    RATING_ATTRIBUTE, TECHNIQUES_ATTRIBUTE,
};
use crate::search::IndexableRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContentCategory {
    Scenarios,
    Demos,
    Templates,
    Guides,
    Datasets,
}

impl ContentCategory {
    pub const ALL: [ContentCategory; 5] = [
        ContentCategory::Scenarios,
        ContentCategory::Demos,
        ContentCategory::Templates,
        ContentCategory::Guides,
        ContentCategory::Datasets,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContentCategory::Scenarios => "Scenarios",
            ContentCategory::Demos => "Demos",
            ContentCategory::Templates => "Templates",
            ContentCategory::Guides => "Guides",
            ContentCategory::Datasets => "Datasets",
        }
    }
}

/// A content library item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub body: String,
    pub category: ContentCategory,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    /// MITRE ATT&CK technique ids covered by the item
    #[serde(default)]
    pub techniques: Vec<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub published: Option<NaiveDate>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub downloads: u64,
}

impl ContentItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>, category: ContentCategory) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            body: String::new(),
            category,
            tags: Vec::new(),
            difficulty: None,
            techniques: Vec::new(),
            platforms: Vec::new(),
            author: None,
            published: None,
            rating: None,
            downloads: 0,
        }
    }
}

impl From<ContentItem> for IndexableRecord {
    fn from(item: ContentItem) -> Self {
        let mut record = IndexableRecord::new(item.id.clone())
            .with_field("title", item.title, TITLE_WEIGHT)
            .with_category(item.category.as_str());

        if !item.id.trim().is_empty() {
            record = record.with_name(item.id);
        }
        if !item.tags.is_empty() {
            record = record.with_field("tags", joined(&item.tags), TAGS_WEIGHT);
        }
        if !item.description.is_empty() {
            record = record.with_field("description", item.description, SUMMARY_WEIGHT);
        }
        if !item.body.is_empty() {
            record = record.with_field("body", item.body, BODY_WEIGHT);
        }

        if let Some(difficulty) = item.difficulty {
            record = record.with_attribute(DIFFICULTY_ATTRIBUTE, difficulty.as_str());
        }
        if !item.techniques.is_empty() {
            record = record.with_attribute(TECHNIQUES_ATTRIBUTE, item.techniques);
        }
        if !item.platforms.is_empty() {
            record = record.with_attribute(PLATFORMS_ATTRIBUTE, item.platforms);
        }
        if let Some(author) = item.author {
            record = record.with_attribute(AUTHOR_ATTRIBUTE, author);
        }
        if let Some(published) = item.published {
            let published = published.format("%Y-%m-%d").to_string();
            record = record.with_attribute(PUBLISHED_ATTRIBUTE, published);
        }
        if let Some(rating) = item.rating {
            record = record.with_attribute(RATING_ATTRIBUTE, rating);
        }
        if item.downloads > 0 {
            let popularity = popularity_from_count(item.downloads);
            record = record.with_attribute(POPULARITY_ATTRIBUTE, popularity);
        }

        record.with_tags(item.tags)
    }
}

/// The content library catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentLibrary;

impl CatalogKind for ContentLibrary {
    type Item = ContentItem;
    const NAME: &'static str = "content";

    fn categories() -> Vec<String> {
        ContentCategory::ALL.iter().map(|c| c.as_str().to_string()).collect()
    }

    fn default_corpus() -> Vec<ContentItem> {
        vec![
            item(
                "cnt_cloud_cred_abuse",
                "Cloud Credential Abuse",
                ContentCategory::Scenarios,
                Difficulty::Intermediate,
                &["cloud", "aws", "identity"],
                &["T1078", "T1530"],
                &["aws"],
                "Simulates stolen access keys used to enumerate and exfiltrate S3 data.",
                ("Priya Nair", "2024-04-10", 4.6),
            ),
            item(
                "cnt_azure_token_theft",
                "Azure Token Theft",
                ContentCategory::Scenarios,
                Difficulty::Intermediate,
                &["cloud", "azure", "identity"],
                &["T1078", "T1528"],
                &["azure"],
                "Replays a stolen refresh token against Microsoft Graph from a new device.",
                ("Priya Nair", "2024-05-02", 4.4),
            ),
            item(
                "cnt_ransomware_demo",
                "Ransomware Kill Chain Demo",
                ContentCategory::Demos,
                Difficulty::Advanced,
                &["ransomware", "edr", "endpoint"],
                &["T1486", "T1490"],
                &["windows"],
                "End-to-end demo from phishing payload to encryption, \
                 with EDR blocking at each stage.",
                ("Lee Park", "2023-12-14", 4.8),
            ),
            item(
                "cnt_pov_plan_template",
                "POV Success Plan Template",
                ContentCategory::Templates,
                Difficulty::Beginner,
                &["pov", "planning", "template"],
                &[],
                &[],
                "Editable success plan with criteria, owners and milestone dates.",
                ("Dana Reyes", "2023-08-22", 4.5),
            ),
            item(
                "cnt_trr_evidence_template",
                "TRR Evidence Template",
                ContentCategory::Templates,
                Difficulty::Beginner,
                &["trr", "evidence", "template"],
                &[],
                &[],
                "Structured evidence sheet for technical review requests.",
                ("Dana Reyes", "2024-02-01", 4.3),
            ),
            item(
                "cnt_lateral_movement_guide",
                "Lateral Movement Detection Guide",
                ContentCategory::Guides,
                Difficulty::Expert,
                &["lateral-movement", "detection", "endpoint"],
                &["T1021", "T1550"],
                &["windows", "linux"],
                "Tuning detections for remote services and pass-the-hash activity.",
                ("Lee Park", "2024-06-18", 4.7),
            ),
            item(
                "cnt_auth_logs_dataset",
                "Cloud Authentication Logs Dataset",
                ContentCategory::Datasets,
                Difficulty::Intermediate,
                &["cloud", "identity", "logs"],
                &["T1078", "T1110"],
                &["aws", "azure"],
                "Labeled sign-in events with brute force and valid-account abuse sessions.",
                ("Priya Nair", "2024-03-05", 4.2),
            ),
        ]
    }
}

#[allow(clippy::too_many_arguments)]
fn item(
    id: &str,
    title: &str,
    category: ContentCategory,
    difficulty: Difficulty,
    tags: &[&str],
    techniques: &[&str],
    platforms: &[&str],
    description: &str,
    (author, published, rating): (&str, &str, f64),
) -> ContentItem {
    let strings = |values: &[&str]| values.iter().map(|v| v.to_string()).collect::<Vec<_>>();
    ContentItem {
        description: description.to_string(),
        tags: strings(tags),
        difficulty: Some(difficulty),
        techniques: strings(techniques),
        platforms: strings(platforms),
        author: Some(author.to_string()),
        published: NaiveDate::parse_from_str(published, "%Y-%m-%d").ok(),
        rating: Some(rating),
        ..ContentItem::new(id, title, category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::validate::validate;
    use crate::search::Recommender;

    #[test]
    fn test_item_conversion() {
        let mut item = ContentItem::new("c1", "Cloud Scenario", ContentCategory::Scenarios);
        item.description = "Short description".to_string();
        item.techniques = vec!["T1078".to_string()];
        item.downloads = 12;

        let record: IndexableRecord = item.into();
        let weights: Vec<(&str, f32)> = record
            .fields
            .iter()
            .map(|f| (f.tag.as_str(), f.weight))
            .collect();
        assert_eq!(weights, vec![("title", 10.0), ("description", 6.0)]);
        assert_eq!(record.attribute_list("techniques"), Some(vec!["T1078"]));
        assert_eq!(record.attribute_number("popularity"), Some(popularity_from_count(12)));
        assert_eq!(record.attribute_text("difficulty"), None);
    }

    #[test]
    fn test_related_cloud_scenarios_rank_first() {
        let records: Vec<IndexableRecord> = ContentLibrary::default_corpus()
            .into_iter()
            .map(Into::into)
            .collect();
        let reference = &records[0];

        let ranked = Recommender::default().recommend(reference, &records, 3);
        assert_eq!(ranked[0].record.id.as_str(), "cnt_azure_token_theft");
    }

    #[test]
    fn test_default_corpus_is_valid() {
        let records: Vec<IndexableRecord> = ContentLibrary::default_corpus()
            .into_iter()
            .map(Into::into)
            .collect();
        let report = validate(&records, &ContentLibrary::categories());
        assert!(report.is_valid, "{report:?}");
    }
}
