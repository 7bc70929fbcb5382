//! Baseline Accuracy Oracle
//!
//! Accuracy of the unadapted source-only model, used to anchor thresholds.
//! The sweep only needs the [`BaselineOracle`] trait; [`BaselineTable`] is
//! an in-memory implementation loadable from JSON, and any
//! `Fn(&Task, DomainType, Split) -> Result<f64>` works as an oracle too.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::record::{DomainType, Split, Task};
use crate::{Error, Result};

/// Source-only model accuracy lookup.
///
/// Implementations must be deterministic; the sweep may call them from
/// several threads.
pub trait BaselineOracle: Sync {
    /// Accuracy of the source-only model for `task` on `domain`/`split`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTask`] (or any other error) when no baseline
    /// exists; the sweep propagates it to the caller.
    fn lookup(&self, task: &Task, domain: DomainType, split: Split) -> Result<f64>;

    /// Baseline that anchors the threshold axis of `domain`.
    ///
    /// # Errors
    ///
    /// Propagates [`lookup`](Self::lookup) errors.
    fn threshold_baseline(&self, task: &Task, domain: DomainType) -> Result<f64> {
        self.lookup(task, domain, domain.threshold_split())
    }
}

impl<F> BaselineOracle for F
where
    F: Fn(&Task, DomainType, Split) -> Result<f64> + Sync,
{
    fn lookup(&self, task: &Task, domain: DomainType, split: Split) -> Result<f64> {
        self(task, domain, split)
    }
}

/// One baseline measurement.
///
/// Source-side entries leave `target_domains` empty: the source-only model's
/// source accuracy does not depend on the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineEntry {
    /// Dataset name
    pub dataset: String,
    /// Source domains
    pub src_domains: Vec<String>,
    /// Target domains (empty for source-side entries)
    #[serde(default)]
    pub target_domains: Vec<String>,
    /// Side the accuracy was measured on
    pub domain: DomainType,
    /// Split the accuracy was measured on
    pub split: Split,
    /// Accuracy
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BaselineKey {
    dataset: String,
    src_domains: Vec<String>,
    target_domains: Vec<String>,
    domain: DomainType,
    split: Split,
}

impl BaselineKey {
    fn new(task: &Task, domain: DomainType, split: Split) -> Self {
        let target_domains = match domain {
            DomainType::Source => Vec::new(),
            DomainType::Target => task.target_domains().to_vec(),
        };
        Self {
            dataset: task.dataset().to_string(),
            src_domains: task.src_domains().to_vec(),
            target_domains,
            domain,
            split,
        }
    }
}

/// In-memory baseline accuracies.
#[derive(Debug, Clone, Default)]
pub struct BaselineTable {
    accuracies: FxHashMap<BaselineKey, f64>,
}

impl BaselineTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from entries; later entries overwrite earlier ones.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = BaselineEntry>) -> Self {
        let mut table = Self::new();
        for entry in entries {
            let task = Task::new(entry.dataset, entry.src_domains, entry.target_domains);
            table.insert(&task, entry.domain, entry.split, entry.accuracy);
        }
        table
    }

    /// Load entries from a JSON array file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not a JSON array of entries
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let entries: Vec<BaselineEntry> = serde_json::from_str(&text)?;
        Ok(Self::from_entries(entries))
    }

    /// Number of stored baselines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accuracies.len()
    }

    /// Check if no baselines are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accuracies.is_empty()
    }

    /// Store one baseline.
    pub fn insert(&mut self, task: &Task, domain: DomainType, split: Split, accuracy: f64) {
        self.accuracies
            .insert(BaselineKey::new(task, domain, split), accuracy);
    }
}

impl BaselineOracle for BaselineTable {
    fn lookup(&self, task: &Task, domain: DomainType, split: Split) -> Result<f64> {
        self.accuracies
            .get(&BaselineKey::new(task, domain, split))
            .copied()
            .ok_or_else(|| Error::UnknownTask {
                task: task.name(),
                domain: domain.to_string(),
                split: split.to_string(),
            })
    }
}
