// Application Layer - Use Cases and Business Logic

pub mod autosave;
pub mod reporter;
pub mod retry;
pub mod scheduler;
pub mod selection;
pub mod sweep;
pub mod worker;

// Re-exports
pub use autosave::Autosave;
pub use reporter::{CheckpointStats, ReportRow, Reporter, SweepSummary};
pub use retry::{CheckpointPartition, RetryDecision, RetryPolicy};
pub use scheduler::{ItemStatus, PoolConfig, RunReport, Scheduler};
pub use selection::select;
pub use sweep::{SweepConfig, SweepOutcome, SweepPlan, SweepService};
pub use worker::{shutdown_channel, ShutdownSender, ShutdownToken};
