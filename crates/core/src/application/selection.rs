// Work Selector - decides what this run has to do

use crate::application::retry::CheckpointPartition;
use crate::domain::{InputIdentifier, WorkSet};
use std::collections::HashSet;

/// Compute this run's WorkSet
///
/// `(scanned - done - exhausted) ∪ retryable`, deduplicated. Scanned order is
/// kept; retryable identifiers that were not scanned follow in sorted order.
/// Nothing in `partition.done` is ever selected.
pub fn select(scanned: &[InputIdentifier], partition: &CheckpointPartition) -> WorkSet {
    let mut seen: HashSet<&str> = HashSet::with_capacity(scanned.len());
    let mut work = WorkSet::with_capacity(scanned.len() + partition.retryable.len());

    for id in scanned {
        if partition.is_settled(id) || !seen.insert(id.as_str()) {
            continue;
        }
        work.push(id.clone());
    }

    for id in &partition.retryable {
        if seen.insert(id.as_str()) {
            work.push(id.clone());
        }
    }

    work
}
