// Autosave Service
// Periodically persists in-flight results so a coordinator crash loses at
// most one interval of work

use crate::application::worker::ShutdownToken;
use crate::domain::{ResultTable, SharedResultTable};
use crate::error::Result;
use crate::port::CheckpointStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

/// Background checkpoint writer
pub struct Autosave {
    store: Arc<dyn CheckpointStore>,
    prior: ResultTable,
    results: SharedResultTable,
    interval: Duration,
}

impl Autosave {
    /// Create a new autosave task
    ///
    /// # Arguments
    /// * `store` - Checkpoint store to write to
    /// * `prior` - Table loaded at the start of the run
    /// * `results` - Live table the scheduler writes into
    /// * `interval` - Time between saves
    pub fn new(
        store: Arc<dyn CheckpointStore>,
        prior: ResultTable,
        results: SharedResultTable,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            prior,
            results,
            interval,
        }
    }

    /// Save every interval until `stop` fires
    ///
    /// A save already in progress when `stop` fires is finished first, so the
    /// caller can safely write the final checkpoint after awaiting this.
    pub async fn run(self, mut stop: ShutdownToken) {
        info!(interval_secs = self.interval.as_secs_f64(), "Autosave started");

        let mut tick = interval(self.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        tick.tick().await;

        loop {
            tokio::select! {
                _ = stop.wait() => break,
                _ = tick.tick() => {
                    if let Err(e) = self.flush_now().await {
                        error!(error = %e, "Autosave failed");
                    }
                }
            }
        }

        debug!("Autosave stopped");
    }

    /// Persist the current snapshot merged over the prior checkpoint
    pub async fn flush_now(&self) -> Result<usize> {
        let snapshot = self.results.snapshot();
        if snapshot.is_empty() {
            return Ok(0);
        }

        let merged = self.store.save(&self.prior, &snapshot).await?;
        debug!(
            new_records = snapshot.len(),
            total_records = merged.len(),
            "Autosave checkpoint written"
        );
        Ok(snapshot.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::worker::shutdown_channel;
    use crate::domain::ResultRecord;
    use crate::port::checkpoint_store::mocks::InMemoryCheckpointStore;

    #[tokio::test]
    async fn test_flush_now_skips_empty_snapshot() {
        let store = InMemoryCheckpointStore::new();
        let autosave = Autosave::new(
            Arc::new(store.clone()),
            ResultTable::new(),
            SharedResultTable::new(),
            Duration::from_secs(1),
        );

        assert_eq!(autosave.flush_now().await.unwrap(), 0);
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_flush_now_merges_over_prior() {
        let store = InMemoryCheckpointStore::new();
        let mut prior = ResultTable::new();
        prior.upsert("old.cnf", ResultRecord::new(1.0, Some(true), 2, 2));
        let results = SharedResultTable::new();
        results.upsert("new.cnf", ResultRecord::placeholder(10.0));

        let autosave = Autosave::new(
            Arc::new(store.clone()),
            prior,
            results,
            Duration::from_secs(1),
        );

        assert_eq!(autosave.flush_now().await.unwrap(), 1);
        let persisted = store.persisted().unwrap();
        assert_eq!(persisted.len(), 2);
        assert!(persisted.contains("old.cnf"));
        assert!(persisted.contains("new.cnf"));
    }

    #[tokio::test]
    async fn test_run_saves_periodically_until_stopped() {
        let store = InMemoryCheckpointStore::new();
        let results = SharedResultTable::new();
        results.upsert("a.cnf", ResultRecord::placeholder(10.0));

        let autosave = Autosave::new(
            Arc::new(store.clone()),
            ResultTable::new(),
            results,
            Duration::from_millis(20),
        );
        let (stop_tx, stop) = shutdown_channel();
        let handle = tokio::spawn(autosave.run(stop));

        tokio::time::sleep(Duration::from_millis(110)).await;
        stop_tx.shutdown();
        handle.await.unwrap();

        let saves = store.save_count();
        assert!(saves >= 2, "expected periodic saves, got {}", saves);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(store.save_count(), saves, "no saves after stop");
    }
}
