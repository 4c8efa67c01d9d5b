//! Pairwise similarity scoring for "related items" recommendations.
//!
//! Scores are additive (see [`RecommendWeights`]):
//!
//! | Feature | Contribution |
//! |---------|--------------|
//! | same category | `category` |
//! | difficulty distance `d` | `max(0, difficulty - d)` |
//! | each shared tag | `shared_tag` |
//! | each shared technique id | `shared_technique` |
//! | each shared platform | `shared_platform` |
//! | candidate rating/popularity `p` | `popularity * p` |
//!
//! List features only count when both records define the attribute. `p` is
//! clamped to `0..=5`; catalogs convert raw counts with
//! [`popularity_from_count`] before storing them.

use super::secondary::normalize_key;
use super::types::{IndexableRecord, Recommendation};
use crate::config::{
    RecommendWeights, DIFFICULTY_LEVELS, POPULARITY_COUNT_CAP, POPULARITY_SCALE_MAX,
};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Attribute holding the difficulty level.
pub const DIFFICULTY_ATTRIBUTE: &str = "difficulty";
/// Attribute holding technique identifiers (e.g. MITRE ATT&CK ids).
pub const TECHNIQUES_ATTRIBUTE: &str = "techniques";
/// Attribute holding target platforms.
pub const PLATFORMS_ATTRIBUTE: &str = "platforms";
/// Preferred popularity signal.
pub const RATING_ATTRIBUTE: &str = "rating";
/// Fallback popularity signal.
pub const POPULARITY_ATTRIBUTE: &str = "popularity";

/// Position of `level` on the difficulty scale.
pub fn difficulty_index(level: &str) -> Option<usize> {
    let level = normalize_key(level);
    DIFFICULTY_LEVELS.iter().position(|l| *l == level)
}

/// Maps a raw usage count onto the `0..=POPULARITY_SCALE_MAX` rating scale.
///
/// Scaling is logarithmic: `5 * ln(1 + n) / ln(1 + cap)`, saturating at the cap.
pub fn popularity_from_count(count: u64) -> f64 {
    let scaled =
        POPULARITY_SCALE_MAX * (count as f64).ln_1p() / (POPULARITY_COUNT_CAP as f64).ln_1p();
    scaled.min(POPULARITY_SCALE_MAX)
}

/// Similarity scorer parameterized by weights.
#[derive(Debug, Clone, Default)]
pub struct Recommender {
    weights: RecommendWeights,
}

impl Recommender {
    pub fn new(weights: RecommendWeights) -> Self {
        Self { weights }
    }

    /// Scores `candidate` against `reference`.
    pub fn score(&self, reference: &IndexableRecord, candidate: &IndexableRecord) -> f32 {
        let w = &self.weights;
        let mut score = 0.0;

        if let (Some(a), Some(b)) = (&reference.category, &candidate.category) {
            if normalize_key(a) == normalize_key(b) {
                score += w.category;
            }
        }

        let level = |r: &IndexableRecord| {
            r.attribute_text(DIFFICULTY_ATTRIBUTE)
                .and_then(difficulty_index)
        };
        if let (Some(a), Some(b)) = (level(reference), level(candidate)) {
            let distance = a.abs_diff(b) as f32;
            score += (w.difficulty - distance).max(0.0);
        }

        let shared_tags = shared_count(
            reference.tags.iter().map(String::as_str),
            candidate.tags.iter().map(String::as_str),
        );
        let shared_techniques = shared_attribute(reference, candidate, TECHNIQUES_ATTRIBUTE);
        let shared_platforms = shared_attribute(reference, candidate, PLATFORMS_ATTRIBUTE);
        score += w.shared_tag * shared_tags as f32;
        score += w.shared_technique * shared_techniques as f32;
        score += w.shared_platform * shared_platforms as f32;

        let popularity = candidate
            .attribute_number(RATING_ATTRIBUTE)
            .or_else(|| candidate.attribute_number(POPULARITY_ATTRIBUTE))
            .filter(|p| p.is_finite())
            .map(|p| p.clamp(0.0, POPULARITY_SCALE_MAX))
            .unwrap_or(0.0);
        score += w.popularity * popularity as f32;

        score
    }

    /// Ranks `pool` by similarity to `reference`, excluding the reference itself.
    pub fn recommend<'a, I>(
        &self,
        reference: &IndexableRecord,
        pool: I,
        limit: usize,
    ) -> Vec<Recommendation>
    where
        I: IntoIterator<Item = &'a IndexableRecord>,
    {
        let mut ranked: Vec<Recommendation> = pool
            .into_iter()
            .filter(|candidate| candidate.id != reference.id)
            .map(|candidate| Recommendation {
                score: self.score(reference, candidate),
                record: candidate.clone(),
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.record.id.cmp(&b.record.id))
        });
        ranked.truncate(limit);
        ranked
    }
}

fn shared_count<'a>(a: impl Iterator<Item = &'a str>, b: impl Iterator<Item = &'a str>) -> usize {
    let a: BTreeSet<String> = a.map(normalize_key).filter(|v| !v.is_empty()).collect();
    let b: BTreeSet<String> = b.map(normalize_key).filter(|v| !v.is_empty()).collect();
    a.intersection(&b).count()
}

fn shared_attribute(reference: &IndexableRecord, candidate: &IndexableRecord, key: &str) -> usize {
    match (reference.attribute_list(key), candidate.attribute_list(key)) {
        (Some(a), Some(b)) => shared_count(a.into_iter(), b.into_iter()),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario(id: &str, difficulty: &str, tags: &[&str]) -> IndexableRecord {
        IndexableRecord::new(id)
            .with_category("Scenarios")
            .with_attribute("difficulty", difficulty)
            .with_tags(tags.iter().copied())
    }

    #[test]
    fn test_difficulty_index() {
        assert_eq!(difficulty_index("Beginner"), Some(0));
        assert_eq!(difficulty_index("expert"), Some(3));
        assert_eq!(difficulty_index("legendary"), None);
    }

    #[test]
    fn test_category_difficulty_and_tag_score() {
        let first = scenario("c1", "intermediate", &["cloud", "aws"]);
        let second = scenario("c2", "intermediate", &["cloud", "azure"]);

        let score = Recommender::default().score(&first, &second);
        assert!((score - 6.0).abs() < f32::EPSILON, "got {score}");
    }

    #[test]
    fn test_difficulty_adjacency_not_identity() {
        let recommender = Recommender::default();
        let base = IndexableRecord::new("a").with_attribute("difficulty", "beginner");
        let adjacent = IndexableRecord::new("b").with_attribute("difficulty", "intermediate");
        let far = IndexableRecord::new("c").with_attribute("difficulty", "expert");

        assert_eq!(recommender.score(&base, &adjacent), 1.0);
        assert_eq!(recommender.score(&base, &far), 0.0);
    }

    #[test]
    fn test_list_attributes_require_both_sides() {
        let recommender = Recommender::default();
        let a = IndexableRecord::new("a")
            .with_attribute("techniques", vec!["T1078".to_string(), "T1110".to_string()])
            .with_attribute("platforms", vec!["aws".to_string()]);
        let b = IndexableRecord::new("b")
            .with_attribute("techniques", vec!["t1078".to_string()])
            .with_attribute("platforms", vec!["AWS".to_string(), "gcp".to_string()]);
        let c = IndexableRecord::new("c");

        assert!((recommender.score(&a, &b) - 0.8).abs() < 1e-6);
        assert_eq!(recommender.score(&a, &c), 0.0);
    }

    #[test]
    fn test_rating_breaks_ties() {
        let reference = scenario("ref", "advanced", &["edr"]);
        let low = scenario("low", "advanced", &["edr"]).with_attribute("rating", 3.0);
        let high = scenario("high", "advanced", &["edr"]).with_attribute("rating", 4.5);
        let popular = scenario("pop", "advanced", &["edr"]).with_attribute("popularity", 4.0);

        let ranked = Recommender::default().recommend(&reference, [&low, &high, &popular], 5);
        let ids: Vec<&str> = ranked.iter().map(|r| r.record.id.as_str()).collect();
        assert_eq!(ids, vec!["high", "pop", "low"]);
    }

    #[test]
    fn test_popularity_from_count_is_bounded() {
        assert_eq!(popularity_from_count(0), 0.0);
        let at_cap = popularity_from_count(POPULARITY_COUNT_CAP);
        assert!((at_cap - POPULARITY_SCALE_MAX).abs() < 1e-9);
        assert_eq!(popularity_from_count(u64::MAX), POPULARITY_SCALE_MAX);

        let small = popularity_from_count(10);
        let large = popularity_from_count(5000);
        assert!(small > 0.0 && small < large, "{small} vs {large}");
    }

    #[test]
    fn test_popularity_bonus_never_outweighs_a_shared_tag() {
        let weights = RecommendWeights::default();
        let recommender = Recommender::new(weights.clone());
        let reference = IndexableRecord::new("ref");
        let unrated = IndexableRecord::new("plain");
        let huge = IndexableRecord::new("huge")
            .with_attribute("popularity", 1_000_000.0);
        let negative = IndexableRecord::new("neg").with_attribute("rating", -50.0);

        let bonus = recommender.score(&reference, &huge) - recommender.score(&reference, &unrated);
        assert!(bonus <= weights.shared_tag, "bonus {bonus}");
        assert_eq!(recommender.score(&reference, &negative), 0.0);
    }

    #[test]
    fn test_popular_unrelated_record_does_not_beat_similar_one() {
        let reference = IndexableRecord::new("ref")
            .with_category("Best Practices")
            .with_tags(["trr", "validation", "review"]);
        let twin = IndexableRecord::new("twin")
            .with_category("Best Practices")
            .with_tags(["trr", "validation", "review"])
            .with_attribute("popularity", popularity_from_count(10));
        let unrelated = IndexableRecord::new("unrelated")
            .with_category("Reference")
            .with_attribute("popularity", popularity_from_count(5000));

        let ranked = Recommender::default().recommend(&reference, [&unrelated, &twin], 5);
        let ids: Vec<&str> = ranked.iter().map(|r| r.record.id.as_str()).collect();
        assert_eq!(ids, vec!["twin", "unrelated"]);
        assert!(ranked[1].score <= 1.0, "got {}", ranked[1].score);
    }

    #[test]
    fn test_excludes_reference_and_truncates() {
        let reference = scenario("ref", "beginner", &[]);
        let pool: Vec<IndexableRecord> = (0..5)
            .map(|i| scenario(&format!("c{i}"), "beginner", &[]))
            .chain(std::iter::once(reference.clone()))
            .collect();

        let ranked = Recommender::default().recommend(&reference, &pool, 3);
        assert_eq!(ranked.len(), 3);
        assert!(ranked.iter().all(|r| r.record.id != reference.id));
        // equal scores fall back to id order
        assert_eq!(ranked[0].record.id.as_str(), "c0");
    }
}
