use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Unique record identifier.
///
/// Opaque string assigned by the caller (e.g. `"kb_trr_001"`) or generated
/// by the engine when a record arrives without one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Creates an id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random id (UUID v4).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the id is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One weighted, tokenized field of a record (e.g. `title`/10, `body`/5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchableField {
    /// Field tag reported back in `matched_fields` (e.g. `"title"`)
    pub tag: String,
    /// Raw field text
    pub text: String,
    /// Score contributed per matching query token
    pub weight: f32,
}

impl SearchableField {
    pub fn new(tag: impl Into<String>, text: impl Into<String>, weight: f32) -> Self {
        Self {
            tag: tag.into(),
            text: text.into(),
            weight,
        }
    }
}

/// Domain-specific attribute value, consumed by filters and the recommender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Flag(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

impl From<f64> for AttributeValue {
    fn from(n: f64) -> Self {
        AttributeValue::Number(n)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Flag(b)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(list: Vec<String>) -> Self {
        AttributeValue::List(list)
    }
}

/// Generic indexable record shared by every catalog.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndexableRecord {
    /// Primary key; generated on upsert when blank
    pub id: RecordId,
    /// Exact-match names (case-insensitive, not tokenized)
    #[serde(default)]
    pub primary_names: Vec<String>,
    /// Secondary exact-match names resolving to the same record
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Ordered weighted fields consumed by tokenization and scoring
    #[serde(default)]
    pub fields: Vec<SearchableField>,
    /// Classification from the catalog's closed enumeration
    #[serde(default)]
    pub category: Option<String>,
    /// Free-form labels
    #[serde(default)]
    pub tags: Vec<String>,
    /// Open bag of scalar/list attributes (difficulty, platforms, author, ...)
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl IndexableRecord {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.primary_names.push(name.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_field(
        mut self,
        tag: impl Into<String>,
        text: impl Into<String>,
        weight: f32,
    ) -> Self {
        self.fields.push(SearchableField::new(tag, text, weight));
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Highest-weighted field; the first one wins on equal weights.
    pub fn top_field(&self) -> Option<&SearchableField> {
        self.fields.iter().fold(None, |best: Option<&SearchableField>, field| match best {
            Some(b) if b.weight >= field.weight => Some(b),
            _ => Some(field),
        })
    }

    /// Secondary ranking key: first primary name, else the top field's text.
    pub fn sort_key(&self) -> String {
        self.primary_names
            .first()
            .map(String::as_str)
            .or_else(|| self.top_field().map(|f| f.text.as_str()))
            .unwrap_or_default()
            .to_lowercase()
    }

    /// Human-facing title: the `title`/`name` field if present, else the sort key.
    pub fn display_title(&self) -> &str {
        self.top_field()
            .map(|f| f.text.as_str())
            .or_else(|| self.primary_names.first().map(String::as_str))
            .unwrap_or(self.id.as_str())
    }

    /// Returns a text attribute.
    pub fn attribute_text(&self, key: &str) -> Option<&str> {
        match self.attributes.get(key)? {
            AttributeValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns a numeric attribute. Numeric text (e.g. `"4.5"`) is accepted.
    pub fn attribute_number(&self, key: &str) -> Option<f64> {
        match self.attributes.get(key)? {
            AttributeValue::Number(n) => Some(*n),
            AttributeValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns a list attribute. A single text value is treated as a one-element list.
    pub fn attribute_list(&self, key: &str) -> Option<Vec<&str>> {
        match self.attributes.get(key)? {
            AttributeValue::List(values) => Some(values.iter().map(String::as_str).collect()),
            AttributeValue::Text(s) => Some(vec![s.as_str()]),
            _ => None,
        }
    }
}

/// Partial update applied by [`RecordEngine::update`](super::RecordEngine::update).
///
/// Every `Some` member replaces the stored value wholesale. In JSON an
/// absent `category` leaves it untouched and `null` clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordPatch {
    pub primary_names: Option<Vec<String>>,
    pub aliases: Option<Vec<String>>,
    pub fields: Option<Vec<SearchableField>>,
    #[serde(
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub attributes: Option<BTreeMap<String, AttributeValue>>,
}

// Only called for keys present in the input, so `null` becomes `Some(None)`.
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl RecordPatch {
    pub(crate) fn apply(self, record: &mut IndexableRecord) {
        if let Some(names) = self.primary_names {
            record.primary_names = names;
        }
        if let Some(aliases) = self.aliases {
            record.aliases = aliases;
        }
        if let Some(fields) = self.fields {
            record.fields = fields;
        }
        if let Some(category) = self.category {
            record.category = category;
        }
        if let Some(tags) = self.tags {
            record.tags = tags;
        }
        if let Some(attributes) = self.attributes {
            record.attributes = attributes;
        }
    }
}

/// Structured post-filters for [`RecordEngine::search`](super::RecordEngine::search).
///
/// Values are kept as raw strings: a malformed value (blank, unparseable
/// date) drops that filter instead of failing the query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilters {
    /// Category equality (case-insensitive)
    pub category: Option<String>,
    /// Record must carry every listed tag
    pub tags: Vec<String>,
    /// `author` attribute equality (case-insensitive)
    pub author: Option<String>,
    /// Inclusive lower bound on the `published` attribute
    pub published_from: Option<String>,
    /// Inclusive upper bound on the `published` attribute
    pub published_to: Option<String>,
}

impl SearchFilters {
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn published_between(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.published_from = Some(from.into());
        self.published_to = Some(to.into());
        self
    }
}

/// Highlight snippet for one matched field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlight {
    pub field: String,
    pub snippet: String,
}

/// A ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub record: IndexableRecord,
    pub score: f32,
    /// Tags of the fields that matched at least one query token, in field order
    pub matched_fields: Vec<String>,
    pub highlights: Vec<Highlight>,
}

/// A ranked recommendation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub record: IndexableRecord,
    pub score: f32,
}

/// Which kind of exact-match name was involved in a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NameKind {
    Primary,
    Alias,
}

/// Non-fatal data-quality event produced by a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A name is already owned by another record; the new mapping was rejected
    NameConflict {
        name: String,
        name_kind: NameKind,
        owner: RecordId,
        rejected: RecordId,
    },
    /// A name freed by a removal or update was handed to another claimant
    NameReassigned { name: String, to: RecordId },
    /// The record arrived without an id and one was generated
    IdGenerated { id: RecordId },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::NameConflict {
                name,
                name_kind,
                owner,
                rejected,
            } => {
                let kind = match name_kind {
                    NameKind::Primary => "name",
                    NameKind::Alias => "alias",
                };
                write!(f, "{kind} '{name}' of {rejected} already resolves to {owner}")
            }
            Diagnostic::NameReassigned { name, to } => {
                write!(f, "name '{name}' now resolves to {to}")
            }
            Diagnostic::IdGenerated { id } => write!(f, "generated id {id}"),
        }
    }
}

/// Result of an upsert or update.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertOutcome {
    /// The record as stored (with its final id)
    pub record: IndexableRecord,
    pub diagnostics: Vec<Diagnostic>,
}

/// Report produced by the registry integrity validator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub is_valid: bool,
    pub duplicate_names: Vec<String>,
    pub duplicate_aliases: Vec<String>,
    pub missing_classification: Vec<RecordId>,
}
