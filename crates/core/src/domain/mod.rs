// Domain Layer - Pure business logic and entities

pub mod record;
pub mod result_table;

// Re-exports
pub use record::{InputIdentifier, ResultRecord, WorkSet};
pub use result_table::{ResultTable, SharedResultTable};
