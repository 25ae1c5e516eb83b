// Reporter - final rows, run summary, and the closing checkpoint save

use crate::application::retry::CheckpointPartition;
use crate::application::scheduler::RunReport;
use crate::domain::{ResultTable, WorkSet};
use crate::error::Result;
use crate::port::CheckpointStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// One output row, in checkpoint column order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub filename: String,
    pub seconds: f64,
    pub sat: Option<bool>,
    pub nof_vars: Option<u64>,
    pub nof_clauses: Option<u64>,
}

/// Per-run counts shown to the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    /// Identifiers found by the scanner
    pub scanned: usize,
    /// Scanned identifiers skipped because they already have a verdict
    pub skipped_done: usize,
    /// Scanned identifiers skipped because they used up the retry threshold
    pub skipped_exhausted: usize,
    /// Prior unresolved entries attempted again
    pub retried: usize,
    /// Size of the WorkSet
    pub attempted: usize,
    pub completed: usize,
    pub timed_out: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// Attempted items that still have no verdict
    pub unresolved: usize,
    pub satisfiable: usize,
    pub unsatisfiable: usize,
    /// Records produced by this run
    pub new_records: usize,
    /// Records in the checkpoint after the merge
    pub total_records: usize,
}

/// Counts describing a stored checkpoint under a retry threshold
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckpointStats {
    pub total: usize,
    pub satisfiable: usize,
    pub unsatisfiable: usize,
    pub retryable: usize,
    pub exhausted: usize,
}

impl CheckpointStats {
    pub fn new(table: &ResultTable, partition: &CheckpointPartition) -> Self {
        let count = |sat: bool| table.iter().filter(|(_, r)| r.sat == Some(sat)).count();
        Self {
            total: table.len(),
            satisfiable: count(true),
            unsatisfiable: count(false),
            retryable: partition.retryable.len(),
            exhausted: partition.exhausted.len(),
        }
    }
}

/// Reporter assembles output and delegates persistence to the store
pub struct Reporter {
    store: Arc<dyn CheckpointStore>,
}

impl Reporter {
    pub fn new(store: Arc<dyn CheckpointStore>) -> Self {
        Self { store }
    }

    /// Output rows for `table`, sorted by identifier
    pub fn finalize(&self, table: &ResultTable) -> Vec<ReportRow> {
        table
            .iter()
            .map(|(id, record)| ReportRow {
                filename: id.clone(),
                seconds: record.seconds,
                sat: record.sat,
                nof_vars: record.nof_vars,
                nof_clauses: record.nof_clauses,
            })
            .collect()
    }

    /// Merge this run's records over the prior checkpoint and save
    pub async fn persist(&self, existing: &ResultTable, new: &ResultTable) -> Result<ResultTable> {
        let merged = self.store.save(existing, new).await?;
        info!(
            new_records = new.len(),
            total_records = merged.len(),
            "Checkpoint saved"
        );
        Ok(merged)
    }

    /// Build the user-facing summary for a finished run
    pub fn summarize(
        &self,
        scanned: &[String],
        partition: &CheckpointPartition,
        work: &WorkSet,
        run: &RunReport,
        total_records: usize,
    ) -> SweepSummary {
        let skipped_done = scanned.iter().filter(|id| partition.done.contains(*id)).count();
        let skipped_exhausted = scanned
            .iter()
            .filter(|id| partition.exhausted.contains(*id))
            .count();
        let retried = work
            .iter()
            .filter(|id| partition.retryable.contains(*id))
            .count();

        let satisfiable = run
            .results
            .iter()
            .filter(|(_, r)| r.sat == Some(true))
            .count();
        let unsatisfiable = run
            .results
            .iter()
            .filter(|(_, r)| r.sat == Some(false))
            .count();

        SweepSummary {
            scanned: scanned.len(),
            skipped_done,
            skipped_exhausted,
            retried,
            attempted: work.len(),
            completed: run.completed,
            timed_out: run.timed_out,
            failed: run.failed,
            cancelled: run.cancelled,
            unresolved: work.len().saturating_sub(satisfiable + unsatisfiable),
            satisfiable,
            unsatisfiable,
            new_records: run.results.len(),
            total_records,
        }
    }
}
