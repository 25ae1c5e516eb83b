// Checkpoint Store Port (Interface)

use crate::domain::ResultTable;
use crate::error::Result;
use async_trait::async_trait;

/// Durable storage for the result table
///
/// A missing checkpoint is not an error: `load` returns an empty table.
/// Unreadable or unwritable storage is always surfaced as
/// `AppError::CheckpointIo`, never swallowed.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Load every persisted record (empty table if nothing was saved yet)
    async fn load(&self) -> Result<ResultTable>;

    /// Merge `new` over `existing` and persist the merged table
    ///
    /// On duplicate identifiers the record from `new` wins. Returns the table
    /// that was written.
    async fn save(&self, existing: &ResultTable, new: &ResultTable) -> Result<ResultTable>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// In-memory checkpoint store
    #[derive(Default, Clone)]
    pub struct InMemoryCheckpointStore {
        table: Arc<Mutex<Option<ResultTable>>>,
        saves: Arc<Mutex<usize>>,
    }

    impl InMemoryCheckpointStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_table(table: ResultTable) -> Self {
            Self {
                table: Arc::new(Mutex::new(Some(table))),
                saves: Arc::new(Mutex::new(0)),
            }
        }

        /// Last persisted table, if any save or seed happened
        pub fn persisted(&self) -> Option<ResultTable> {
            self.table.lock().unwrap().clone()
        }

        pub fn save_count(&self) -> usize {
            *self.saves.lock().unwrap()
        }
    }

    #[async_trait]
    impl CheckpointStore for InMemoryCheckpointStore {
        async fn load(&self) -> Result<ResultTable> {
            Ok(self.table.lock().unwrap().clone().unwrap_or_default())
        }

        async fn save(&self, existing: &ResultTable, new: &ResultTable) -> Result<ResultTable> {
            let merged = existing.merged_with(new);
            *self.table.lock().unwrap() = Some(merged.clone());
            *self.saves.lock().unwrap() += 1;
            Ok(merged)
        }
    }
}
