// Solve Adapter Port
// Abstraction over the opaque solve computation running in an isolated unit

use crate::domain::{InputIdentifier, ResultRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What a finished solve reports back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    pub seconds: f64,
    pub sat: Option<bool>,
    pub nof_vars: u64,
    pub nof_clauses: u64,
}

impl From<SolveReport> for ResultRecord {
    fn from(report: SolveReport) -> Self {
        ResultRecord::new(report.seconds, report.sat, report.nof_vars, report.nof_clauses)
    }
}

/// Per-item solve errors
///
/// These never propagate past the scheduler; they are logged and the item
/// keeps its placeholder record.
#[derive(Error, Debug)]
pub enum SolveError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    /// The adapter enforced a limit of its own and gave up. The subprocess
    /// adapter never returns this; the scheduler's timeout covers it.
    #[error("Solver timed out after {0:.3}s")]
    Timeout(f64),

    #[error("Solver crashed: {0}")]
    Crashed(String),

    #[error("Invalid solver output: {0}")]
    InvalidOutput(String),

    #[error("IO error: {0}")]
    Io(String),
}

/// Solve Adapter trait
///
/// Implementations:
/// - SubprocessSolver: one isolated OS process per item, hard-killed when the
///   returned future is dropped
///
/// Dropping the future returned by `solve` must terminate the underlying
/// execution; the scheduler relies on this to enforce its timeout.
#[async_trait]
pub trait SolveAdapter: Send + Sync {
    /// Solve one formula
    ///
    /// # Errors
    /// - SolveError::SpawnFailed if the isolated unit cannot be started
    /// - SolveError::Crashed if it exits abnormally
    /// - SolveError::InvalidOutput if its report cannot be interpreted
    async fn solve(&self, id: &InputIdentifier) -> Result<SolveReport, SolveError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Mock solver behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Finish after `delay` and report `report`
        Complete { delay: Duration, report: SolveReport },
        /// Never finish (only a timeout or shutdown ends it)
        Hang,
        /// Return an error
        Fail(String),
        /// Panic inside the solve future
        Panic(String),
        /// Report an adapter-side timeout
        Timeout(f64),
    }

    impl MockBehavior {
        pub fn sat_after(delay: Duration, seconds: f64) -> Self {
            MockBehavior::Complete {
                delay,
                report: SolveReport {
                    seconds,
                    sat: Some(true),
                    nof_vars: 250,
                    nof_clauses: 1065,
                },
            }
        }

        pub fn unsat_after(delay: Duration, seconds: f64) -> Self {
            MockBehavior::Complete {
                delay,
                report: SolveReport {
                    seconds,
                    sat: Some(false),
                    nof_vars: 250,
                    nof_clauses: 1065,
                },
            }
        }
    }

    /// Mock Solve Adapter with per-identifier behavior
    pub struct MockSolveAdapter {
        default: MockBehavior,
        overrides: HashMap<InputIdentifier, MockBehavior>,
        calls: Arc<Mutex<Vec<InputIdentifier>>>,
        in_flight: Arc<AtomicUsize>,
        max_in_flight: Arc<AtomicUsize>,
    }

    impl MockSolveAdapter {
        pub fn new(default: MockBehavior) -> Self {
            Self {
                default,
                overrides: HashMap::new(),
                calls: Arc::new(Mutex::new(Vec::new())),
                in_flight: Arc::new(AtomicUsize::new(0)),
                max_in_flight: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn with(mut self, id: impl Into<InputIdentifier>, behavior: MockBehavior) -> Self {
            self.overrides.insert(id.into(), behavior);
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn calls(&self) -> Vec<InputIdentifier> {
            self.calls.lock().unwrap().clone()
        }

        /// Highest number of concurrent `solve` calls observed
        pub fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }

        /// Calls currently running (dropped futures are not counted)
        pub fn in_flight(&self) -> usize {
            self.in_flight.load(Ordering::SeqCst)
        }
    }

    struct InFlightGuard(Arc<AtomicUsize>);

    impl Drop for InFlightGuard {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl SolveAdapter for MockSolveAdapter {
        async fn solve(&self, id: &InputIdentifier) -> Result<SolveReport, SolveError> {
            self.calls.lock().unwrap().push(id.clone());

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            let _guard = InFlightGuard(Arc::clone(&self.in_flight));

            let behavior = self.overrides.get(id).unwrap_or(&self.default).clone();

            match behavior {
                MockBehavior::Complete { delay, report } => {
                    tokio::time::sleep(delay).await;
                    Ok(report)
                }
                MockBehavior::Hang => std::future::pending().await,
                MockBehavior::Fail(msg) => Err(SolveError::Crashed(msg)),
                MockBehavior::Panic(msg) => {
                    panic!("{}", msg); // Actually panic for isolation testing
                }
                MockBehavior::Timeout(secs) => Err(SolveError::Timeout(secs)),
            }
        }
    }
}
