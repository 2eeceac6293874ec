//! Canonical tag string derivation.
//!
//! # Responsibility
//! - Collapse a tag collection into the single persisted representation:
//!   deduplicated, sorted, comma-joined.
//!
//! # Invariants
//! - Tags compare by exact string equality; no case folding is applied.
//! - A tag containing a literal comma cannot round-trip through the
//!   canonical string. Known limitation, kept on purpose.

use std::collections::BTreeSet;

/// Builds the canonical comma-joined tag string.
///
/// Duplicates are removed with set semantics and the survivors are sorted
/// in ascending lexicographic order. Empty input yields an empty string.
pub fn canonical_tag_string(tags: &[String]) -> String {
    let unique: BTreeSet<&str> = tags.iter().map(String::as_str).collect();
    unique.into_iter().collect::<Vec<_>>().join(",")
}

/// Decomposes a canonical tag string back into a list.
///
/// Pure split on `,` with empty segments filtered out, so an empty string
/// yields an empty list.
pub fn split_tag_string(tags: &str) -> Vec<String> {
    tags.split(',')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}
