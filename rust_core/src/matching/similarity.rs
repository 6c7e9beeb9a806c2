//! Similarity scoring between normalized names.
//!
//! The blended score is the mean of an edit-distance ratio and a Jaccard
//! index over word tokens. Both halves are symmetric, so the blend is too.

use rustc_hash::FxHashSet;

/// Levenshtein distance in characters (insert, delete, substitute cost 1)
pub fn edit_distance(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// `1 - edit_distance / max_len`, or 1.0 when both strings are empty
pub fn similarity_score(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - edit_distance(a, b) as f64 / max_len as f64
}

/// Jaccard index of the whitespace-delimited token sets, 0.0 when both
/// sets are empty
pub fn token_similarity(a: &str, b: &str) -> f64 {
    let tokens_a: FxHashSet<&str> = a.split_whitespace().collect();
    let tokens_b: FxHashSet<&str> = b.split_whitespace().collect();

    let union = tokens_a.union(&tokens_b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = tokens_a.intersection(&tokens_b).count();
    intersection as f64 / union as f64
}

/// Blended similarity in [0, 1] of two already-normalized names.
/// Two empty names are identical and score 1.0.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    (similarity_score(a, b) + token_similarity(a, b)) / 2.0
}
