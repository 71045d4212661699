//! Query-set change detection.
//!
//! Two query sets are compared by the text of each query only. The
//! symmetric difference `(old ∪ new) − (old ∩ new)` is non-empty exactly
//! when a query was added, removed or edited; reordering and duplicates
//! do not count as a change.

use std::collections::HashSet;

use super::types::Query;

/// Query texts present in exactly one of `left` and `right`.
///
/// Results keep first-seen order: texts from `left`, then texts that only
/// `right` contributes.
pub fn query_difference(left: &[Query], right: &[Query]) -> Vec<String> {
    let left_texts: HashSet<&str> = left.iter().map(|q| q.text.as_str()).collect();
    let right_texts: HashSet<&str> = right.iter().map(|q| q.text.as_str()).collect();

    let mut seen = HashSet::new();
    left.iter()
        .chain(right.iter())
        .map(|q| q.text.as_str())
        .filter(|text| seen.insert(*text))
        .filter(|text| !(left_texts.contains(text) && right_texts.contains(text)))
        .map(str::to_string)
        .collect()
}

/// Whether the two query sets differ by text.
pub fn queries_differ(left: &[Query], right: &[Query]) -> bool {
    !query_difference(left, right).is_empty()
}
