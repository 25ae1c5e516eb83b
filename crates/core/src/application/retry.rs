// Retry eligibility for checkpointed results
use crate::domain::{InputIdentifier, ResultRecord, ResultTable};
use crate::error::{AppError, Result};
use std::collections::BTreeSet;
use tracing::debug;

/// Classification of one checkpointed record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Has a verdict; never re-run
    Done,
    /// No verdict and cut off below the threshold; worth another attempt
    Retry,
    /// No verdict and already ran for at least the threshold; skipped for good
    Exhausted,
}

/// Retry policy for unresolved checkpoint entries
///
/// The threshold is configured separately from the run's timeout. Usually the
/// two are equal, so items that used the whole budget last time are skipped
/// while items cut off by a smaller budget are retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    threshold_seconds: f64,
}

impl RetryPolicy {
    /// Create a new retry policy
    ///
    /// # Errors
    /// - AppError::Validation if the threshold is not a positive finite number
    pub fn new(threshold_seconds: f64) -> Result<Self> {
        if !threshold_seconds.is_finite() || threshold_seconds <= 0.0 {
            return Err(AppError::Validation(format!(
                "retry threshold must be a positive number of seconds, got {}",
                threshold_seconds
            )));
        }
        Ok(Self { threshold_seconds })
    }

    pub fn threshold_seconds(&self) -> f64 {
        self.threshold_seconds
    }

    /// Decide what to do with a previously recorded result
    pub fn decide(&self, record: &ResultRecord) -> RetryDecision {
        if record.is_resolved() {
            RetryDecision::Done
        } else if record.seconds < self.threshold_seconds {
            RetryDecision::Retry
        } else {
            RetryDecision::Exhausted
        }
    }

    /// Split a checkpoint table into disjoint done/retryable/exhausted sets
    pub fn partition(&self, table: &ResultTable) -> CheckpointPartition {
        let mut partition = CheckpointPartition::default();

        for (id, record) in table {
            let bucket = match self.decide(record) {
                RetryDecision::Done => &mut partition.done,
                RetryDecision::Retry => &mut partition.retryable,
                RetryDecision::Exhausted => &mut partition.exhausted,
            };
            bucket.insert(id.clone());
        }

        debug!(
            done = partition.done.len(),
            retryable = partition.retryable.len(),
            exhausted = partition.exhausted.len(),
            threshold_seconds = self.threshold_seconds,
            "Checkpoint partitioned"
        );

        partition
    }
}

/// Disjoint split of a checkpoint table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckpointPartition {
    pub done: BTreeSet<InputIdentifier>,
    pub retryable: BTreeSet<InputIdentifier>,
    pub exhausted: BTreeSet<InputIdentifier>,
}

impl CheckpointPartition {
    /// True if the identifier already has an entry that must not be re-run
    pub fn is_settled(&self, id: &str) -> bool {
        self.done.contains(id) || self.exhausted.contains(id)
    }
}
