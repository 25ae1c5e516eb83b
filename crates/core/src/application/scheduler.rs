//! Scheduler/Pool - runs the Solve Adapter over a WorkSet
//!
//! - At most `num_workers` solves are in flight; the rest wait for a slot
//! - Each dispatched item first gets a conservative placeholder record
//! - Each solve is bounded by the per-item timeout and abandoned (hard
//!   killed by the adapter) when it expires
//! - Every item resolves to exactly one `ItemStatus`, which the coordinating
//!   task applies to the result table and the progress counter

use crate::application::worker::{describe_join_error, ShutdownToken};
use crate::domain::{InputIdentifier, ResultRecord, ResultTable, SharedResultTable};
use crate::error::{AppError, Result};
use crate::port::{ProgressObserver, SolveAdapter, SolveError, TimeProvider};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use tracing::{debug, error, info, warn};

/// Pool sizing and per-item budget
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolConfig {
    pub num_workers: usize,
    pub timeout_seconds: f64,
}

impl PoolConfig {
    pub fn new(num_workers: usize, timeout_seconds: f64) -> Self {
        Self {
            num_workers,
            timeout_seconds,
        }
    }

    /// Check that a pool with this configuration can be created
    pub fn validate(&self) -> Result<()> {
        if self.num_workers == 0 {
            return Err(AppError::Validation(
                "num_workers must be greater than zero".to_string(),
            ));
        }
        if self.num_workers > Semaphore::MAX_PERMITS {
            return Err(AppError::Validation(format!(
                "num_workers must not exceed {}",
                Semaphore::MAX_PERMITS
            )));
        }
        if !self.timeout_seconds.is_finite() || self.timeout_seconds <= 0.0 {
            return Err(AppError::Validation(format!(
                "timeout must be a positive number of seconds, got {}",
                self.timeout_seconds
            )));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_seconds)
    }
}

/// How a single item ended
#[derive(Debug, Clone, PartialEq)]
pub enum ItemStatus {
    /// The solver returned a report
    Completed(ResultRecord),
    /// The budget expired; the placeholder stays
    TimedOut,
    /// The solver errored or panicked; the placeholder stays
    Failed(String),
    /// Shutdown killed the solve after `elapsed_seconds`
    Interrupted { elapsed_seconds: f64 },
    /// Shutdown arrived before the item got a slot; nothing was recorded
    Cancelled,
}

/// Outcome of one `Scheduler::run`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Records written during this run
    pub results: ResultTable,
    /// Items accounted for (always equals the WorkSet length)
    pub progress: usize,
    pub completed: usize,
    pub timed_out: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl RunReport {
    fn record(&mut self, status: &ItemStatus) {
        match status {
            ItemStatus::Completed(_) => self.completed += 1,
            ItemStatus::TimedOut => self.timed_out += 1,
            ItemStatus::Failed(_) => self.failed += 1,
            ItemStatus::Interrupted { .. } | ItemStatus::Cancelled => self.cancelled += 1,
        }
    }
}

/// Everything an item task needs, cheap to clone
#[derive(Clone)]
struct ItemContext {
    adapter: Arc<dyn SolveAdapter>,
    time_provider: Arc<dyn TimeProvider>,
    slots: Arc<Semaphore>,
    results: SharedResultTable,
    config: PoolConfig,
    shutdown: ShutdownToken,
}

/// Scheduler dispatches solves over a fixed-size pool
pub struct Scheduler {
    adapter: Arc<dyn SolveAdapter>,
    progress: Arc<dyn ProgressObserver>,
    time_provider: Arc<dyn TimeProvider>,
}

impl Scheduler {
    pub fn new(
        adapter: Arc<dyn SolveAdapter>,
        progress: Arc<dyn ProgressObserver>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            adapter,
            progress,
            time_provider,
        }
    }

    /// Run every item of `work` and return when all of them resolved
    ///
    /// Per-item failures never surface here. Only an invalid pool
    /// configuration is an error.
    pub async fn run(
        &self,
        work: &[InputIdentifier],
        config: PoolConfig,
        results: &SharedResultTable,
        shutdown: ShutdownToken,
    ) -> Result<RunReport> {
        config.validate()?;

        info!(
            items = work.len(),
            num_workers = config.num_workers,
            timeout_seconds = config.timeout_seconds,
            "Dispatching work"
        );

        let ctx = ItemContext {
            adapter: Arc::clone(&self.adapter),
            time_provider: Arc::clone(&self.time_provider),
            slots: Arc::new(Semaphore::new(config.num_workers)),
            results: results.clone(),
            config,
            shutdown,
        };

        self.progress.started(work.len());

        let mut tasks = JoinSet::new();
        let mut pending: HashMap<task::Id, InputIdentifier> = HashMap::with_capacity(work.len());
        for id in work {
            let handle = tasks.spawn(run_item(ctx.clone(), id.clone()));
            pending.insert(handle.id(), id.clone());
        }

        let mut report = RunReport::default();
        while let Some(joined) = tasks.join_next_with_id().await {
            let (id, status) = match joined {
                Ok((task_id, outcome)) => {
                    pending.remove(&task_id);
                    outcome
                }
                Err(join_err) => {
                    let id = pending.remove(&join_err.id()).unwrap_or_default();
                    error!(identifier = %id, error = %join_err, "Item task aborted unexpectedly");
                    (id, ItemStatus::Failed(describe_join_error(join_err)))
                }
            };
            self.apply(&id, &status, results);
            report.record(&status);
            self.progress.item_finished(&id, &status);
            report.progress += 1;
        }

        self.progress.finished();
        report.results = results.snapshot();

        info!(
            progress = report.progress,
            completed = report.completed,
            timed_out = report.timed_out,
            failed = report.failed,
            cancelled = report.cancelled,
            "All items resolved"
        );

        Ok(report)
    }

    /// Apply an item's status to the result table (single writer per item)
    fn apply(&self, id: &str, status: &ItemStatus, results: &SharedResultTable) {
        match status {
            ItemStatus::Completed(record) => {
                debug!(
                    identifier = %id,
                    seconds = record.seconds,
                    sat = ?record.sat,
                    "Solver completed"
                );
                results.upsert(id, record.clone());
            }
            ItemStatus::TimedOut => {
                info!(identifier = %id, "Solver timed out");
            }
            ItemStatus::Failed(reason) => {
                warn!(identifier = %id, error = %reason, "Solver failed");
            }
            ItemStatus::Interrupted { elapsed_seconds } => {
                debug!(identifier = %id, elapsed_seconds, "Solver interrupted");
                results.upsert(id, ResultRecord::interrupted(*elapsed_seconds));
            }
            ItemStatus::Cancelled => {}
        }
    }
}

/// Drive one item from queued to resolved
async fn run_item(ctx: ItemContext, id: InputIdentifier) -> (InputIdentifier, ItemStatus) {
    let mut shutdown = ctx.shutdown.clone();

    let _slot = tokio::select! {
        biased;
        _ = shutdown.wait() => return (id, ItemStatus::Cancelled),
        slot = Arc::clone(&ctx.slots).acquire_owned() => match slot {
            Ok(slot) => slot,
            Err(_) => return (id, ItemStatus::Cancelled),
        },
    };

    ctx.results
        .upsert(id.clone(), ResultRecord::placeholder(ctx.config.timeout_seconds));
    let started_at = ctx.time_provider.now_millis();

    let adapter = Arc::clone(&ctx.adapter);
    let solve_id = id.clone();
    let mut handle = tokio::spawn(async move { adapter.solve(&solve_id).await });

    let (status, abandoned) = tokio::select! {
        biased;
        _ = shutdown.wait() => {
            let elapsed_seconds = ctx.time_provider.seconds_since(started_at);
            (ItemStatus::Interrupted { elapsed_seconds }, true)
        }
        joined = tokio::time::timeout(ctx.config.timeout(), &mut handle) => match joined {
            Ok(Ok(Ok(report))) => (ItemStatus::Completed(report.into()), false),
            Ok(Ok(Err(SolveError::Timeout(_)))) => (ItemStatus::TimedOut, false),
            Ok(Ok(Err(e))) => (ItemStatus::Failed(e.to_string()), false),
            Ok(Err(join_err)) => (ItemStatus::Failed(describe_join_error(join_err)), false),
            Err(_) => (ItemStatus::TimedOut, true),
        },
    };

    if abandoned {
        // Dropping the solve future kills the isolated unit; wait for that
        // before the slot is released.
        handle.abort();
        let _ = handle.await;
    }

    (id, status)
}
