//! Indexed retrieval over generic records.
//!
//! # Architecture
//!
//! - `types`: Core types (RecordId, IndexableRecord, SearchHit, Diagnostic, ...)
//! - `tokenizer`: Text → lowercase tokens
//! - `keyword`: Inverted index (token → record ids)
//! - `secondary`: Exact-match indices (category, tag) and the alias table
//! - `query`: Weighted scoring, phrase bonus, filters, highlights
//! - `recommend`: Pairwise similarity for related-item suggestions
//! - `validate`: Registry integrity report
//! - `engine`: [`RecordEngine`] tying the store and every index together, and
//!   [`SharedEngine`] for lock-guarded sharing
//!
//! # Usage
//!
//! ```
//! use quarry_core::config::EngineConfig;
//! use quarry_core::search::{IndexableRecord, RecordEngine, SearchFilters};
//!
//! let mut engine = RecordEngine::new(EngineConfig::default(), ["Best Practices"]);
//! engine.upsert(
//!     IndexableRecord::new("kb_trr_001")
//!         .with_field("title", "TRR Validation Best Practices", 10.0)
//!         .with_category("Best Practices"),
//! );
//!
//! let hits = engine.search("trr validation", &SearchFilters::default());
//! assert_eq!(hits[0].record.id.as_str(), "kb_trr_001");
//! ```
//!
//! # Consistency
//!
//! Every mutation runs remove-then-add against every index for the touched
//! id, so re-indexing is idempotent and no posting outlives its record.
//! Ranking is fully deterministic: ties fall back to the sort key, then id.

pub mod keyword;
pub mod query;
pub mod recommend;
pub mod secondary;
pub mod tokenizer;
pub mod types;
pub mod validate;

mod engine;

pub use types::{
    AttributeValue, Diagnostic, Highlight, IndexableRecord, IntegrityReport, NameKind, RecordId,
    RecordPatch, Recommendation, SearchFilters, SearchHit, SearchableField, UpsertOutcome,
};

pub use engine::{RecordEngine, SharedEngine};
pub use recommend::Recommender;
pub use tokenizer::{tokenize, tokenize_with};
