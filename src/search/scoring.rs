//! Scoring functions for text search and related-entry discovery
//!
//! Tokens are a literal whitespace split of the lower-cased text: no
//! stemming, no stopword removal and no punctuation stripping.

use std::collections::HashSet;

/// Relevance of `content` for `query`.
///
/// Counts non-overlapping, case-insensitive occurrences of `query` in
/// `content` and divides by the whitespace-delimited word count of the whole
/// content. Returns 0.0 for an empty query or empty content.
pub fn relevance(query: &str, content: &str) -> f64 {
    let query = query.to_lowercase();
    if query.is_empty() {
        return 0.0;
    }

    let content = content.to_lowercase();
    let words = content.split_whitespace().count();
    if words == 0 {
        return 0.0;
    }

    let occurrences = content.matches(query.as_str()).count();
    occurrences as f64 / words as f64
}

/// Lower-cased whitespace tokens of `text` as a set.
pub fn token_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Jaccard similarity: |a ∩ b| / |a ∪ b|, 0.0 when both sets are empty.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    intersection as f64 / union as f64
}
