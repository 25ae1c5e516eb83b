// Port Layer - Interfaces for external dependencies

pub mod checkpoint_store;
pub mod corpus_scanner;
pub mod progress;
pub mod solve_adapter;
pub mod time_provider;

// Re-exports
pub use checkpoint_store::CheckpointStore;
pub use corpus_scanner::CorpusScanner;
pub use progress::{NoopProgress, ProgressObserver};
pub use solve_adapter::{SolveAdapter, SolveError, SolveReport};
pub use time_provider::TimeProvider;
