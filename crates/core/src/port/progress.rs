// Progress Observer Port

use crate::application::scheduler::ItemStatus;

/// Receives one notification per WorkSet item
///
/// `item_finished` is called exactly once per item, from the coordinating
/// task, in the order completions are observed.
pub trait ProgressObserver: Send + Sync {
    /// Called once before dispatch with the WorkSet size
    fn started(&self, _total: usize) {}

    fn item_finished(&self, id: &str, status: &ItemStatus);

    /// Called once after the last item finished
    fn finished(&self) {}
}

/// Observer that ignores every event
pub struct NoopProgress;

impl ProgressObserver for NoopProgress {
    fn item_finished(&self, _id: &str, _status: &ItemStatus) {}
}
