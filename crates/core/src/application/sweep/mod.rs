// Sweep Service - scan, select, solve, persist

pub mod config;

pub use config::SweepConfig;

use crate::application::autosave::Autosave;
use crate::application::reporter::{Reporter, SweepSummary};
use crate::application::retry::CheckpointPartition;
use crate::application::scheduler::{RunReport, Scheduler};
use crate::application::selection::select;
use crate::application::worker::{shutdown_channel, ShutdownToken};
use crate::domain::{InputIdentifier, ResultTable, SharedResultTable, WorkSet};
use crate::error::Result;
use crate::port::{CheckpointStore, CorpusScanner};
use std::sync::Arc;
use tracing::{info, warn};

/// What a run is going to do, computed before anything is dispatched
#[derive(Debug, Clone)]
pub struct SweepPlan {
    pub scanned: Vec<InputIdentifier>,
    pub prior: ResultTable,
    pub partition: CheckpointPartition,
    pub work: WorkSet,
}

/// Result of a finished (or interrupted) sweep
#[derive(Debug, Clone)]
pub struct SweepOutcome {
    pub summary: SweepSummary,
    /// Records produced by this run
    pub new_results: ResultTable,
}

/// Sweep Service
pub struct SweepService {
    scanner: Arc<dyn CorpusScanner>,
    store: Arc<dyn CheckpointStore>,
    scheduler: Scheduler,
    reporter: Reporter,
}

impl SweepService {
    pub fn new(
        scanner: Arc<dyn CorpusScanner>,
        store: Arc<dyn CheckpointStore>,
        scheduler: Scheduler,
    ) -> Self {
        let reporter = Reporter::new(Arc::clone(&store));
        Self {
            scanner,
            store,
            scheduler,
            reporter,
        }
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// Scan the corpus and decide what this run has to do
    ///
    /// # Errors
    /// - AppError::InvalidRoot if the corpus root is not a directory
    /// - AppError::CheckpointIo / CheckpointFormat if the checkpoint cannot be read
    pub async fn plan(&self, config: &SweepConfig) -> Result<SweepPlan> {
        config.validate()?;
        let policy = config.retry_policy()?;

        let scanned = self.scanner.scan(&config.root, config.recursive)?;
        if scanned.is_empty() {
            warn!(root = %config.root.display(), "No formulas found matching the pattern");
        }

        let prior = self.store.load().await?;
        let partition = policy.partition(&prior);
        let work = select(&scanned, &partition);

        info!(
            scanned = scanned.len(),
            checkpointed = prior.len(),
            done = partition.done.len(),
            retryable = partition.retryable.len(),
            exhausted = partition.exhausted.len(),
            selected = work.len(),
            "Sweep planned"
        );

        Ok(SweepPlan {
            scanned,
            prior,
            partition,
            work,
        })
    }

    /// Run a full sweep: plan, solve the WorkSet, persist, summarize
    ///
    /// When `shutdown` fires, undispatched items are skipped, running ones
    /// are killed, and whatever finished is still saved.
    pub async fn execute(&self, config: &SweepConfig, shutdown: ShutdownToken) -> Result<SweepOutcome> {
        let plan = self.plan(config).await?;

        if plan.work.is_empty() {
            info!("Nothing to do: every scanned formula is done or exhausted");
            let summary = self.reporter.summarize(
                &plan.scanned,
                &plan.partition,
                &plan.work,
                &RunReport::default(),
                plan.prior.len(),
            );
            return Ok(SweepOutcome {
                summary,
                new_results: ResultTable::new(),
            });
        }

        let results = SharedResultTable::new();
        let (stop_autosave, autosave_token) = shutdown_channel();
        let autosave = config.autosave_interval.map(|interval| {
            let task = Autosave::new(
                Arc::clone(&self.store),
                plan.prior.clone(),
                results.clone(),
                interval,
            );
            tokio::spawn(task.run(autosave_token))
        });

        let run = self
            .scheduler
            .run(&plan.work, config.pool_config(), &results, shutdown)
            .await;

        stop_autosave.shutdown();
        if let Some(handle) = autosave {
            if let Err(e) = handle.await {
                warn!(error = %e, "Autosave task ended abnormally");
            }
        }

        let run = run?;
        let merged = self.reporter.persist(&plan.prior, &run.results).await?;
        let summary = self.reporter.summarize(
            &plan.scanned,
            &plan.partition,
            &plan.work,
            &run,
            merged.len(),
        );

        info!(
            new_records = summary.new_records,
            total_records = summary.total_records,
            unresolved = summary.unresolved,
            "Sweep finished"
        );

        Ok(SweepOutcome {
            summary,
            new_results: run.results,
        })
    }
}
