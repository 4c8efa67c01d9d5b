//! Scoring defaults and engine configuration.
//!
//! The constants below are the production defaults. They are grouped into
//! [`EngineConfig`], which can be overridden from a TOML file; every field is
//! optional in the file and falls back to the constant.
//!
//! # Usage
//!
//! ```
//! use quarry_core::config::{EngineConfig, DEFAULT_RESULT_LIMIT};
//!
//! let config = EngineConfig::from_toml_str("[query]\nphrase_bonus = 20.0\n").unwrap();
//! assert_eq!(config.query.phrase_bonus, 20.0);
//! assert_eq!(config.query.result_limit, DEFAULT_RESULT_LIMIT);
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

// =============================================================================
// Field Weights
// =============================================================================

/// Weight of a record's title or primary name field.
pub const TITLE_WEIGHT: f32 = 10.0;

/// Weight of the flattened tag list field.
pub const TAGS_WEIGHT: f32 = 8.0;

/// Weight of a short summary or description field.
pub const SUMMARY_WEIGHT: f32 = 6.0;

/// Weight of the long-form body field.
pub const BODY_WEIGHT: f32 = 5.0;

/// Weight of auxiliary fields (usage strings, examples).
pub const AUXILIARY_WEIGHT: f32 = 3.0;

// =============================================================================
// Query Engine
// =============================================================================

/// Bonus awarded when the whole query appears verbatim in the highest-weighted field.
pub const PHRASE_BONUS: f32 = 15.0;

/// Default cap on the number of search hits.
pub const DEFAULT_RESULT_LIMIT: usize = 25;

/// Upper bound accepted for a configured result limit.
pub const MAX_RESULT_LIMIT: usize = 50;

/// Characters of context kept on each side of a highlighted match.
pub const HIGHLIGHT_CONTEXT_CHARS: usize = 50;

/// Tokens shorter than this (in chars) are discarded by the tokenizer.
pub const MIN_TOKEN_LEN: usize = 3;

/// Marker appended or prepended when a highlight snippet is clipped.
pub const ELLIPSIS: &str = "...";

// =============================================================================
// Recommendation Scorer
// =============================================================================

/// Bonus for an exact category match.
pub const CATEGORY_MATCH_WEIGHT: f32 = 3.0;

/// Maximum bonus for difficulty adjacency (`max(0, w - |delta|)`).
pub const DIFFICULTY_WEIGHT: f32 = 2.0;

/// Bonus per tag shared by both records.
pub const SHARED_TAG_WEIGHT: f32 = 1.0;

/// Bonus per shared technique identifier.
pub const SHARED_TECHNIQUE_WEIGHT: f32 = 0.5;

/// Bonus per shared platform.
pub const SHARED_PLATFORM_WEIGHT: f32 = 0.3;

/// Multiplier applied to the candidate's rating or popularity.
pub const POPULARITY_WEIGHT: f32 = 0.2;

/// Top of the rating/popularity scale. Values above it are clamped, so the
/// bonus never exceeds `POPULARITY_WEIGHT * POPULARITY_SCALE_MAX`.
pub const POPULARITY_SCALE_MAX: f64 = 5.0;

/// Raw usage count (views, downloads, invocations) that maps to the top of
/// the popularity scale. Counts are scaled logarithmically below it.
pub const POPULARITY_COUNT_CAP: u64 = 10_000;

/// Ordered difficulty scale used for adjacency scoring.
pub const DIFFICULTY_LEVELS: [&str; 4] = ["beginner", "intermediate", "advanced", "expert"];

// =============================================================================
// Configuration Structs
// =============================================================================

/// Query engine tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub phrase_bonus: f32,
    pub result_limit: usize,
    pub context_chars: usize,
    pub min_token_len: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            phrase_bonus: PHRASE_BONUS,
            result_limit: DEFAULT_RESULT_LIMIT,
            context_chars: HIGHLIGHT_CONTEXT_CHARS,
            min_token_len: MIN_TOKEN_LEN,
        }
    }
}

/// Additive weights for the recommendation scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendWeights {
    pub category: f32,
    pub difficulty: f32,
    pub shared_tag: f32,
    pub shared_technique: f32,
    pub shared_platform: f32,
    pub popularity: f32,
}

impl Default for RecommendWeights {
    fn default() -> Self {
        Self {
            category: CATEGORY_MATCH_WEIGHT,
            difficulty: DIFFICULTY_WEIGHT,
            shared_tag: SHARED_TAG_WEIGHT,
            shared_technique: SHARED_TECHNIQUE_WEIGHT,
            shared_platform: SHARED_PLATFORM_WEIGHT,
            popularity: POPULARITY_WEIGHT,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub query: QueryConfig,
    pub recommend: RecommendWeights,
}

impl EngineConfig {
    /// Parses a TOML document. Missing tables and keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(text)?;
        Ok(config.validated())
    }

    /// Clamps values into the ranges the engine supports.
    pub fn validated(mut self) -> Self {
        self.query.result_limit = self.query.result_limit.clamp(1, MAX_RESULT_LIMIT);
        self.query.min_token_len = self.query.min_token_len.max(1);
        if !self.query.phrase_bonus.is_finite() || self.query.phrase_bonus < 0.0 {
            self.query.phrase_bonus = PHRASE_BONUS;
        }
        self
    }
}
