//! delta.rs: new-vs-seen classification and the display-only company filter.

use std::collections::HashSet;

use crate::ingest::normalize::TITLE_FIELDS;
use crate::ingest::types::JobRecord;

/// Records of `current` whose `id` is absent from `baseline`, in fetch order.
pub fn new_records(baseline: &[JobRecord], current: &[JobRecord]) -> Vec<JobRecord> {
    let seen: HashSet<&str> = baseline.iter().map(|r| r.id.as_str()).collect();
    current
        .iter()
        .filter(|r| !seen.contains(r.id.as_str()))
        .cloned()
        .collect()
}

/// Case-insensitive substring match on source, title and vendor title fields.
/// A blank filter matches everything.
pub fn matches_company(record: &JobRecord, filter: &str) -> bool {
    let f = filter.trim().to_lowercase();
    if f.is_empty() {
        return true;
    }
    let hit = |s: &str| s.to_lowercase().contains(&f);
    hit(&record.source)
        || hit(&record.title)
        || TITLE_FIELDS
            .iter()
            .filter_map(|k| record.vendor_field(k))
            .any(hit)
}

/// Narrow `records` to what the operator asked to see.
pub fn filter_for_display(records: &[JobRecord], filter: Option<&str>) -> Vec<JobRecord> {
    match filter {
        Some(f) => records
            .iter()
            .filter(|r| matches_company(r, f))
            .cloned()
            .collect(),
        None => records.to_vec(),
    }
}
