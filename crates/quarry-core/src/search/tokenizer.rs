//! Text normalization into index tokens.
//!
//! Tokens are lowercase runs of word characters (alphanumeric or `_`) and
//! hyphens. Everything else is a separator. Tokens shorter than the minimum
//! length are dropped, so stop-word-like fragments ("a", "of", "to") never
//! reach the inverted index.

use crate::config::MIN_TOKEN_LEN;

/// Tokenizes `text` with the default minimum token length.
///
/// # Examples
///
/// ```
/// use quarry_core::search::tokenize;
///
/// assert_eq!(
///     tokenize("TRR Validation: best-practices, v2!"),
///     vec!["trr", "validation", "best-practices"]
/// );
/// assert!(tokenize("   ").is_empty());
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    tokenize_with(text, MIN_TOKEN_LEN)
}

/// Tokenizes `text`, keeping tokens of at least `min_len` characters.
pub fn tokenize_with(text: &str, min_len: usize) -> Vec<String> {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| if is_token_char(c) { c } else { ' ' })
        .collect();

    normalized
        .split_whitespace()
        .map(str::trim)
        .filter(|token| token.chars().count() >= min_len)
        .map(str::to_string)
        .collect()
}

fn is_token_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}
