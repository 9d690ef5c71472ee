use std::collections::BTreeSet;

use crate::models::{Period, ResponseRecord, TargetEntry};

/// Every period present in `rows`, oldest first.
pub fn distinct_periods(rows: &[ResponseRecord]) -> Vec<Period> {
    rows.iter()
        .map(ResponseRecord::period)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Every rated leader present in `rows`, ordered by name.
pub fn distinct_targets(rows: &[ResponseRecord]) -> Vec<TargetEntry> {
    let seen: BTreeSet<(&str, &str)> = rows
        .iter()
        .map(|row| (row.target_id.as_str(), row.target_name.as_str()))
        .collect();

    let mut targets: Vec<TargetEntry> = seen
        .into_iter()
        .map(|(target_id, target_name)| TargetEntry {
            target_id: target_id.to_string(),
            target_name: target_name.to_string(),
        })
        .collect();
    targets.sort_by(|a, b| {
        a.target_name
            .cmp(&b.target_name)
            .then_with(|| a.target_id.cmp(&b.target_id))
    });
    targets
}
