//! Record Table - owned rows, and borrowed slices of them
//!
//! The table is immutable once built. Filtering produces a [`RecordSlice`]
//! of references, so a 202-point sweep never copies a row.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use super::checkpoint_record::{CheckpointKey, CheckpointRecord, IdentityKey};
use super::task::Task;
use crate::{Error, Result};

/// In-memory record table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    records: Vec<CheckpointRecord>,
}

impl RecordTable {
    /// Create a table from records.
    #[must_use]
    pub fn new(records: Vec<CheckpointRecord>) -> Self {
        Self { records }
    }

    /// All records, in input order.
    #[must_use]
    pub fn records(&self) -> &[CheckpointRecord] {
        &self.records
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Borrow every row as a slice.
    #[must_use]
    pub fn view(&self) -> RecordSlice<'_> {
        RecordSlice {
            rows: self.records.iter().collect(),
        }
    }

    /// Distinct tasks in first-occurrence order.
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.view().tasks()
    }

    /// Rows of one task, in input order.
    #[must_use]
    pub fn task_slice(&self, task: &Task) -> RecordSlice<'_> {
        self.view().for_task(task)
    }

    /// Drop rows whose unified validator name is listed.
    #[must_use]
    pub fn exclude_validators(&self, unified_names: &[String]) -> Self {
        if unified_names.is_empty() {
            return self.clone();
        }
        let excluded: FxHashSet<&str> = unified_names.iter().map(String::as_str).collect();
        let records: Vec<CheckpointRecord> = self
            .records
            .iter()
            .filter(|r| !excluded.contains(r.unified_validator().as_str()))
            .cloned()
            .collect();
        debug!(
            removed = self.records.len() - records.len(),
            kept = records.len(),
            "excluded validators"
        );
        Self { records }
    }

    /// Verify that the identity tuple is unique per row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateRecord`] naming the first repeated identity.
    pub fn check_unique_identity(&self) -> Result<()> {
        let mut seen: FxHashSet<IdentityKey<'_>> = FxHashSet::default();
        for record in &self.records {
            if !seen.insert(record.identity_key()) {
                return Err(Error::DuplicateRecord(record.identity()));
            }
        }
        Ok(())
    }

    /// Verify that every checkpoint has one target accuracy across validators.
    ///
    /// Rows with an undefined target accuracy are not compared.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InconsistentAccuracy`] for the first conflicting checkpoint.
    pub fn check_accuracy_consistency(&self) -> Result<()> {
        let mut seen: FxHashMap<CheckpointKey<'_>, f64> = FxHashMap::default();
        for record in &self.records {
            let Some(accuracy) = record.target_accuracy() else {
                continue;
            };
            let first = *seen.entry(record.checkpoint_key()).or_insert(accuracy);
            if first.to_bits() != accuracy.to_bits() {
                return Err(Error::InconsistentAccuracy {
                    checkpoint: record.checkpoint_id(),
                    first,
                    second: accuracy,
                });
            }
        }
        Ok(())
    }
}

impl From<Vec<CheckpointRecord>> for RecordTable {
    fn from(records: Vec<CheckpointRecord>) -> Self {
        Self::new(records)
    }
}

impl FromIterator<CheckpointRecord> for RecordTable {
    fn from_iter<I: IntoIterator<Item = CheckpointRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Borrowed subsequence of a [`RecordTable`], in table order.
#[derive(Debug, Clone, Default)]
pub struct RecordSlice<'a> {
    rows: Vec<&'a CheckpointRecord>,
}

impl<'a> RecordSlice<'a> {
    /// Create a slice from borrowed rows.
    #[must_use]
    pub fn new(rows: Vec<&'a CheckpointRecord>) -> Self {
        Self { rows }
    }

    /// Rows in order.
    #[must_use]
    pub fn rows(&self) -> &[&'a CheckpointRecord] {
        &self.rows
    }

    /// Iterate rows in order.
    pub fn iter(&self) -> impl Iterator<Item = &'a CheckpointRecord> + '_ {
        self.rows.iter().copied()
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the slice has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keep the rows matching `predicate`, preserving order.
    #[must_use]
    pub fn filter<P>(&self, mut predicate: P) -> Self
    where
        P: FnMut(&CheckpointRecord) -> bool,
    {
        Self {
            rows: self.iter().filter(|&r| predicate(r)).collect(),
        }
    }

    /// Distinct tasks in first-occurrence order.
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.partition_by_task()
            .into_iter()
            .map(|(task, _)| task)
            .collect()
    }

    /// Rows of one task.
    #[must_use]
    pub fn for_task(&self, task: &Task) -> Self {
        self.filter(|r| r.task() == task)
    }

    /// Split into per-task slices, tasks in first-occurrence order.
    #[must_use]
    pub fn partition_by_task(&self) -> Vec<(Task, Self)> {
        let mut index: FxHashMap<&'a Task, usize> = FxHashMap::default();
        let mut parts: Vec<(Task, Self)> = Vec::new();
        for row in self.iter() {
            let slot = *index.entry(row.task()).or_insert_with(|| {
                parts.push((row.task().clone(), Self::default()));
                parts.len() - 1
            });
            parts[slot].1.rows.push(row);
        }
        parts
    }

    /// Copy the rows into an owned table.
    #[must_use]
    pub fn to_table(&self) -> RecordTable {
        RecordTable::new(self.iter().cloned().collect())
    }
}
