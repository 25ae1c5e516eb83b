// cnfsweep Infrastructure - CSV Adapter
// Implements: CheckpointStore

mod checkpoint_store;
mod columns;

pub use checkpoint_store::CsvCheckpointStore;
pub use columns::CHECKPOINT_HEADER;
