//! Sweep scenarios end to end through SweepService
//!
//! Mock solver, in-memory scanner, and the real CSV checkpoint in a temp dir.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cnfsweep_core::application::{
    shutdown_channel, ItemStatus, Scheduler, ShutdownToken, SweepConfig, SweepService,
};
use cnfsweep_core::domain::{ResultRecord, ResultTable};
use cnfsweep_core::port::corpus_scanner::mocks::StaticCorpusScanner;
use cnfsweep_core::port::progress::NoopProgress;
use cnfsweep_core::port::solve_adapter::mocks::{MockBehavior, MockSolveAdapter};
use cnfsweep_core::port::time_provider::SystemTimeProvider;
use cnfsweep_core::port::{CheckpointStore, ProgressObserver};
use cnfsweep_infra_csv::CsvCheckpointStore;

struct Harness {
    _dir: tempfile::TempDir,
    store: Arc<CsvCheckpointStore>,
}

impl Harness {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(CsvCheckpointStore::new(dir.path().join("cnf.csv")));
        Self { _dir: dir, store }
    }

    async fn seed(&self, entries: &[(&str, ResultRecord)]) {
        let table: ResultTable = entries
            .iter()
            .map(|(id, record)| (id.to_string(), record.clone()))
            .collect();
        self.store.save(&ResultTable::new(), &table).await.unwrap();
    }

    fn service(
        &self,
        scanned: &[&str],
        adapter: Arc<MockSolveAdapter>,
        progress: Arc<dyn ProgressObserver>,
    ) -> SweepService {
        let scheduler = Scheduler::new(adapter, progress, Arc::new(SystemTimeProvider));
        SweepService::new(
            Arc::new(StaticCorpusScanner::new(scanned.iter().copied())),
            self.store.clone(),
            scheduler,
        )
    }
}

fn config(timeout_seconds: f64, retry_threshold: Option<f64>) -> SweepConfig {
    let mut config = SweepConfig::new("formulas");
    config.num_workers = 2;
    config.timeout_seconds = timeout_seconds;
    config.retry_threshold_seconds = retry_threshold;
    config
}

#[derive(Default)]
struct CountingProgress {
    items: AtomicUsize,
}

impl ProgressObserver for CountingProgress {
    fn item_finished(&self, _id: &str, _status: &ItemStatus) {
        self.items.fetch_add(1, Ordering::SeqCst);
    }
}

/// a completes, b times out, c raises: only a gets a real record
#[tokio::test]
async fn test_complete_timeout_and_failure() {
    let harness = Harness::new();
    let adapter = Arc::new(
        MockSolveAdapter::new(MockBehavior::Hang)
            .with("a", MockBehavior::sat_after(Duration::from_millis(50), 1.0))
            .with("b", MockBehavior::Hang)
            .with("c", MockBehavior::Fail("solver exploded".to_string())),
    );
    let service = harness.service(&["a", "b", "c"], adapter, Arc::new(NoopProgress));

    let outcome = service
        .execute(&config(0.5, None), ShutdownToken::never())
        .await
        .unwrap();

    let table = harness.store.load().await.unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.get("a").unwrap().sat, Some(true));
    assert_eq!(table.get("a").unwrap().seconds, 1.0);
    assert_eq!(table.get("b"), Some(&ResultRecord::placeholder(0.5)));
    assert_eq!(table.get("c"), Some(&ResultRecord::placeholder(0.5)));

    assert_eq!(outcome.summary.attempted, 3);
    assert_eq!(outcome.summary.completed, 1);
    assert_eq!(outcome.summary.timed_out, 1);
    assert_eq!(outcome.summary.failed, 1);
    assert_eq!(outcome.summary.unresolved, 2);
}

/// Prior a done and b timed out early: b is retried, c is new
#[tokio::test]
async fn test_select_done_retryable_and_new() {
    let harness = Harness::new();
    harness
        .seed(&[
            ("a", ResultRecord::new(1.0, Some(true), 10, 40)),
            ("b", ResultRecord::placeholder(2.0)),
        ])
        .await;
    let adapter = Arc::new(MockSolveAdapter::new(MockBehavior::Hang));
    let service = harness.service(&["a", "b", "c"], adapter, Arc::new(NoopProgress));

    let plan = service.plan(&config(5.0, Some(5.0))).await.unwrap();

    assert_eq!(plan.work, vec!["b".to_string(), "c".to_string()]);
    assert!(plan.partition.done.contains("a"));
}

/// An entry that already used the whole retry budget is not selected again
#[tokio::test]
async fn test_exhausted_entry_excluded() {
    let harness = Harness::new();
    harness.seed(&[("b", ResultRecord::placeholder(9.0))]).await;
    let adapter = Arc::new(MockSolveAdapter::new(MockBehavior::Hang));
    let service = harness.service(&["a", "b", "c"], adapter, Arc::new(NoopProgress));

    let plan = service.plan(&config(5.0, Some(5.0))).await.unwrap();

    assert_eq!(plan.work, vec!["a".to_string(), "c".to_string()]);
    assert!(plan.partition.exhausted.contains("b"));
}

/// A larger budget reopens entries that timed out under a smaller one
#[tokio::test]
async fn test_raising_threshold_retries_old_timeouts() {
    let harness = Harness::new();
    harness.seed(&[("b", ResultRecord::placeholder(9.0))]).await;
    let adapter = Arc::new(MockSolveAdapter::new(MockBehavior::unsat_after(
        Duration::ZERO,
        0.1,
    )));
    let service = harness.service(&["b"], adapter.clone(), Arc::new(NoopProgress));

    let outcome = service
        .execute(&config(20.0, None), ShutdownToken::never())
        .await
        .unwrap();

    assert_eq!(outcome.summary.retried, 1);
    assert_eq!(adapter.calls(), vec!["b".to_string()]);
    let table = harness.store.load().await.unwrap();
    assert_eq!(table.get("b").unwrap().sat, Some(false));
}

/// Two runs in a row: the second finds nothing to do
#[tokio::test]
async fn test_second_run_is_idempotent() {
    let harness = Harness::new();
    let adapter = Arc::new(
        MockSolveAdapter::new(MockBehavior::sat_after(Duration::from_millis(10), 0.01))
            .with("slow", MockBehavior::Hang)
            .with("broken", MockBehavior::Fail("bad formula".to_string())),
    );
    let scanned = ["x", "y", "slow", "broken"];
    let service = harness.service(&scanned, adapter.clone(), Arc::new(NoopProgress));
    let config = config(0.3, None);

    let first = service.execute(&config, ShutdownToken::never()).await.unwrap();
    assert_eq!(first.summary.attempted, 4);
    let after_first = harness.store.load().await.unwrap();

    let second = service.execute(&config, ShutdownToken::never()).await.unwrap();

    assert_eq!(second.summary.attempted, 0);
    assert_eq!(second.summary.skipped_done, 2);
    assert_eq!(second.summary.skipped_exhausted, 2);
    assert_eq!(adapter.call_count(), 4);
    assert_eq!(harness.store.load().await.unwrap(), after_first);
}

/// Progress counts every WorkSet item exactly once
#[tokio::test]
async fn test_progress_equals_workset_size() {
    let harness = Harness::new();
    harness
        .seed(&[("done", ResultRecord::new(1.0, Some(true), 1, 1))])
        .await;
    let adapter = Arc::new(
        MockSolveAdapter::new(MockBehavior::sat_after(Duration::from_millis(5), 0.005))
            .with("f2", MockBehavior::Hang)
            .with("f4", MockBehavior::Fail("oops".to_string()))
            .with("f6", MockBehavior::Panic("worker blew up".to_string()))
            .with("f8", MockBehavior::Timeout(0.2)),
    );
    let scanned: Vec<String> = (0..10)
        .map(|i| format!("f{}", i))
        .chain(std::iter::once("done".to_string()))
        .collect();
    let scanned_refs: Vec<&str> = scanned.iter().map(String::as_str).collect();
    let progress = Arc::new(CountingProgress::default());
    let service = harness.service(&scanned_refs, adapter, progress.clone());

    let outcome = service
        .execute(&config(0.2, None), ShutdownToken::never())
        .await
        .unwrap();

    assert_eq!(outcome.summary.attempted, 10);
    assert_eq!(progress.items.load(Ordering::SeqCst), 10);
    assert_eq!(outcome.summary.completed, 6);
    assert_eq!(outcome.summary.timed_out, 2);
    assert_eq!(outcome.summary.failed, 2);
}

/// Interrupting a sweep keeps finished work and leaves the rest retryable
#[tokio::test]
async fn test_interrupted_sweep_saves_partial_results() {
    let harness = Harness::new();
    let adapter = Arc::new(
        MockSolveAdapter::new(MockBehavior::Hang)
            .with("quick", MockBehavior::sat_after(Duration::ZERO, 0.001)),
    );
    let service = harness.service(&["quick", "stuck", "queued"], adapter, Arc::new(NoopProgress));
    let mut config = config(60.0, None);
    config.num_workers = 1;

    let (stop, token) = shutdown_channel();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        stop.shutdown();
    });

    let outcome = service.execute(&config, token).await.unwrap();
    assert_eq!(outcome.summary.attempted, 3);
    assert_eq!(outcome.summary.completed, 1);
    assert_eq!(outcome.summary.cancelled, 2);

    let table = harness.store.load().await.unwrap();
    assert_eq!(table.get("quick").unwrap().sat, Some(true));
    let stuck = table.get("stuck").unwrap();
    assert_eq!(stuck.sat, None);
    assert!(stuck.seconds < 60.0);
    assert!(!table.contains("queued"));

    // Everything unfinished is picked up again
    let plan = service.plan(&config).await.unwrap();
    assert_eq!(plan.work, vec!["stuck".to_string(), "queued".to_string()]);
}
