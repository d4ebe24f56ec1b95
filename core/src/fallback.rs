//! Linear substring scan used when no index snapshot is available.
//!
//! No ranking: matches come back in input order. Callers flag results produced here as
//! degraded.

use crate::index::{Record, RecordId};

/// Whether any of title, author or a genre contains `needle` (already lowercased).
pub fn matches(record: &Record, needle: &str) -> bool {
    record.title.to_lowercase().contains(needle)
        || record.author.to_lowercase().contains(needle)
        || record.genres.iter().any(|g| g.to_lowercase().contains(needle))
}

pub fn scan_records<'a>(records: &'a [Record], query_text: &str, limit: usize) -> Vec<&'a Record> {
    let needle = query_text.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    records.iter().filter(|r| matches(r, &needle)).take(limit).collect()
}

pub fn scan(records: &[Record], query_text: &str, limit: usize) -> Vec<RecordId> {
    scan_records(records, query_text, limit).into_iter().map(|r| r.id.clone()).collect()
}
