// src/search/rank.rs

//! Relevance ranking of unified search results

use crate::backends::PackageRecord;
use crate::translate::DistroFamily;

pub const EXACT_MATCH: u32 = 100;
pub const PREFIX_MATCH: u32 = 50;
pub const SUBSTRING_MATCH: u32 = 25;
pub const DESCRIPTION_MATCH: u32 = 10;
pub const NATIVE_BACKEND: u32 = 5;
pub const INSTALLED: u32 = 2;

/// Score one record against a lower-cased query
pub fn score(record: &PackageRecord, query_lower: &str, native_family: Option<DistroFamily>) -> u32 {
    let name = record.name.to_lowercase();
    let mut score = if name == query_lower {
        EXACT_MATCH
    } else if name.starts_with(query_lower) {
        PREFIX_MATCH
    } else if name.contains(query_lower) {
        SUBSTRING_MATCH
    } else {
        0
    };

    if record.description.to_lowercase().contains(query_lower) {
        score += DESCRIPTION_MATCH;
    }

    let native = match native_family {
        Some(family) => record.backend.is_native() && record.backend.family() == Some(family),
        None => record.backend.is_native(),
    };
    if native {
        score += NATIVE_BACKEND;
    }

    if record.installed {
        score += INSTALLED;
    }

    score
}

/// Score and sort records by relevance to `query`, best first
///
/// The sort is stable, so equally scored records keep discovery order.
pub fn rank(
    mut records: Vec<PackageRecord>,
    query: &str,
    native_family: Option<DistroFamily>,
) -> Vec<PackageRecord> {
    let query_lower = query.to_lowercase();
    for record in &mut records {
        record.score = score(record, &query_lower, native_family);
    }
    records.sort_by(|a, b| b.score.cmp(&a.score));
    records
}
