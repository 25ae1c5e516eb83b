// Sweep Configuration

use crate::application::retry::RetryPolicy;
use crate::application::scheduler::PoolConfig;
use crate::application::worker::constants::{DEFAULT_NUM_WORKERS, DEFAULT_TIMEOUT_SECONDS};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Parameters of one sweep run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Directory holding the formulas
    pub root: PathBuf,

    /// Also search subdirectories
    #[serde(default)]
    pub recursive: bool,

    pub num_workers: usize,

    /// Per-item wall-clock budget
    pub timeout_seconds: f64,

    /// Unresolved checkpoint entries below this elapsed time are retried.
    /// Defaults to `timeout_seconds`.
    #[serde(default)]
    pub retry_threshold_seconds: Option<f64>,

    /// Persist intermediate results this often while the pool runs
    #[serde(default)]
    pub autosave_interval: Option<Duration>,
}

impl SweepConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            recursive: false,
            num_workers: DEFAULT_NUM_WORKERS,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            retry_threshold_seconds: None,
            autosave_interval: None,
        }
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::new(self.num_workers, self.timeout_seconds)
    }

    pub fn retry_threshold_seconds(&self) -> f64 {
        self.retry_threshold_seconds.unwrap_or(self.timeout_seconds)
    }

    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        RetryPolicy::new(self.retry_threshold_seconds())
    }

    /// Reject configurations that cannot start a run
    pub fn validate(&self) -> Result<()> {
        self.pool_config().validate()?;
        self.retry_policy()?;

        if let Some(interval) = self.autosave_interval {
            if interval.is_zero() {
                return Err(AppError::Validation(
                    "autosave interval must be greater than zero".to_string(),
                ));
            }
        }

        Ok(())
    }
}
