// Result Table Domain Model

use super::record::{InputIdentifier, ResultRecord};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Mapping from identifier to its latest known result
///
/// Keys are unique. Iteration is sorted by identifier so persisted
/// checkpoints are deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    entries: BTreeMap<InputIdentifier, ResultRecord>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for `id`, returning the previous one
    pub fn upsert(&mut self, id: impl Into<InputIdentifier>, record: ResultRecord) -> Option<ResultRecord> {
        self.entries.insert(id.into(), record)
    }

    pub fn get(&self, id: &str) -> Option<&ResultRecord> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, InputIdentifier, ResultRecord> {
        self.entries.iter()
    }

    /// Merge `newer` over `self`; on duplicate identifiers `newer` wins
    pub fn merged_with(&self, newer: &ResultTable) -> ResultTable {
        let mut merged = self.clone();
        for (id, record) in newer.iter() {
            merged.upsert(id.clone(), record.clone());
        }
        merged
    }

    /// Number of entries with a definitive verdict
    pub fn resolved_count(&self) -> usize {
        self.entries.values().filter(|r| r.is_resolved()).count()
    }
}

impl FromIterator<(InputIdentifier, ResultRecord)> for ResultTable {
    fn from_iter<I: IntoIterator<Item = (InputIdentifier, ResultRecord)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ResultTable {
    type Item = (&'a InputIdentifier, &'a ResultRecord);
    type IntoIter = btree_map::Iter<'a, InputIdentifier, ResultRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Concurrency-safe result table shared between the scheduler's item tasks
///
/// All mutation goes through single-key `upsert`. Cloning shares the
/// underlying table.
#[derive(Debug, Clone, Default)]
pub struct SharedResultTable {
    inner: Arc<Mutex<ResultTable>>,
}

impl SharedResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, id: impl Into<InputIdentifier>, record: ResultRecord) {
        self.lock().upsert(id, record);
    }

    pub fn get(&self, id: &str) -> Option<ResultRecord> {
        self.lock().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> ResultTable {
        self.lock().clone()
    }

    // A poisoned lock only means a writer panicked between two upserts;
    // every upsert is a single insert, so the table itself is consistent.
    fn lock(&self) -> MutexGuard<'_, ResultTable> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
