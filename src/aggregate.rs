//! Grouped Aggregator
//!
//! Reduces one table slice to one row per group key with two statistics:
//! Spearman correlation between score and target accuracy, and the mean
//! target accuracy of the top-N rows by score.
//!
//! Groups are enumerated in first-occurrence order, so output order is a
//! function of input order alone.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::record::{CheckpointRecord, RecordSlice, Task};
use crate::stats::{spearman, top_n_mean};
use crate::{Error, Result};

/// Group-by granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// `validator, validator_args, dataset, src_domains, target_domains`
    #[default]
    PerTask,
    /// Per task, plus `adapter`
    PerTaskPerAdapter,
}

impl Granularity {
    /// Granularity for a `per_adapter` flag.
    #[must_use]
    pub const fn from_per_adapter(per_adapter: bool) -> Self {
        if per_adapter {
            Self::PerTaskPerAdapter
        } else {
            Self::PerTask
        }
    }

    /// Whether `adapter` is part of the key.
    #[must_use]
    pub const fn per_adapter(self) -> bool {
        matches!(self, Self::PerTaskPerAdapter)
    }

    /// Column names of the group key, in key order.
    #[must_use]
    pub const fn group_by_columns(self) -> &'static [&'static str] {
        match self {
            Self::PerTask => &[
                "validator",
                "validator_args",
                "dataset",
                "src_domains",
                "target_domains",
            ],
            Self::PerTaskPerAdapter => &[
                "validator",
                "validator_args",
                "dataset",
                "src_domains",
                "target_domains",
                "adapter",
            ],
        }
    }
}

/// Owned group key. `adapter` is `Some` only for [`Granularity::PerTaskPerAdapter`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupKey {
    /// Validator family
    pub validator: String,
    /// Canonical validator configuration
    pub validator_args: String,
    /// Task
    pub task: Task,
    /// Adapter, when grouping per adapter
    pub adapter: Option<String>,
}

impl GroupKey {
    /// Key of `record` at `granularity`.
    #[must_use]
    pub fn of(record: &CheckpointRecord, granularity: Granularity) -> Self {
        GroupKeyRef::of(record, granularity).to_owned_key()
    }
}

// Borrowed key used while partitioning; avoids cloning strings per row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct GroupKeyRef<'a> {
    validator: &'a str,
    validator_args: &'a str,
    task: &'a Task,
    adapter: Option<&'a str>,
}

impl<'a> GroupKeyRef<'a> {
    fn of(record: &'a CheckpointRecord, granularity: Granularity) -> Self {
        Self {
            validator: record.validator(),
            validator_args: record.validator_args(),
            task: record.task(),
            adapter: granularity.per_adapter().then(|| record.adapter()),
        }
    }

    fn to_owned_key(self) -> GroupKey {
        GroupKey {
            validator: self.validator.to_string(),
            validator_args: self.validator_args.to_string(),
            task: self.task.clone(),
            adapter: self.adapter.map(str::to_string),
        }
    }
}

/// Column the top-N selection ranks by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankBy {
    /// Validator score (predicted best checkpoints)
    Score,
    /// Target accuracy itself (best achievable checkpoints)
    TargetAccuracy,
}

/// Grouping and selection settings shared by the sweep and the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateConfig {
    granularity: Granularity,
    top_n: usize,
}

impl AggregateConfig {
    /// Create a config.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `top_n` is zero
    pub fn new(granularity: Granularity, top_n: usize) -> Result<Self> {
        if top_n == 0 {
            return Err(Error::InvalidInput(
                "top_n must be greater than 0".to_string(),
            ));
        }
        Ok(Self { granularity, top_n })
    }

    /// Group-by granularity.
    #[must_use]
    pub const fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Number of top-scoring rows averaged per group.
    #[must_use]
    pub const fn top_n(&self) -> usize {
        self.top_n
    }
}

/// Statistics of one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    /// Group key
    pub key: GroupKey,
    /// Spearman correlation of score vs. target accuracy; `None` when undefined
    pub correlation: Option<f64>,
    /// Mean target accuracy of the top-N rows by score
    pub predicted_best_acc: f64,
}

/// Partition `slice` by group key, groups in first-occurrence order.
fn partition<'a>(
    slice: &RecordSlice<'a>,
    granularity: Granularity,
) -> Vec<(GroupKeyRef<'a>, Vec<&'a CheckpointRecord>)> {
    let mut index: FxHashMap<GroupKeyRef<'a>, usize> = FxHashMap::default();
    let mut groups: Vec<(GroupKeyRef<'a>, Vec<&'a CheckpointRecord>)> = Vec::new();
    for row in slice.iter() {
        let key = GroupKeyRef::of(row, granularity);
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((key, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(row);
    }
    groups
}

fn ranked_pairs(rows: &[&CheckpointRecord], rank_by: RankBy) -> Vec<(f64, f64)> {
    rows.iter()
        .filter_map(|r| match rank_by {
            RankBy::Score => r.scored_accuracy(),
            RankBy::TargetAccuracy => r.target_accuracy().map(|a| (a, a)),
        })
        .collect()
}

/// Mean target accuracy of the top-N rows per group, ranked by `rank_by`.
///
/// Groups without a single usable row are omitted.
#[must_use]
pub fn top_n_accuracy_by_group(
    slice: &RecordSlice<'_>,
    config: &AggregateConfig,
    rank_by: RankBy,
) -> Vec<(GroupKey, f64)> {
    partition(slice, config.granularity)
        .into_iter()
        .filter_map(|(key, rows)| {
            let pairs = ranked_pairs(&rows, rank_by);
            top_n_mean(&pairs, config.top_n).map(|acc| (key.to_owned_key(), acc))
        })
        .collect()
}

/// Correlation and top-N accuracy per group of `slice`.
///
/// Rows with an undefined score or target accuracy are skipped for both
/// statistics. A group keeps its top-N row even when its correlation is
/// undefined (fewer than two pairs, or a constant column).
///
/// ```rust
/// use validator_sweep::aggregate::{aggregate, AggregateConfig, Granularity};
/// use validator_sweep::record::{CheckpointRecord, RecordTable, TARGET_ACCURACY};
///
/// let table: RecordTable = [(0.9, 0.95), (0.8, 0.70), (0.7, 0.60), (0.6, 0.50), (0.5, 0.40)]
///     .into_iter()
///     .enumerate()
///     .map(|(epoch, (score, acc))| {
///         CheckpointRecord::builder("D", "DANNConfig", "V")
///             .validator_args("A")
///             .src_domains(["S"])
///             .target_domains(["T"])
///             .epoch(epoch as u64)
///             .score(score)
///             .accuracy(TARGET_ACCURACY, acc)
///             .build()
///     })
///     .collect();
///
/// let config = AggregateConfig::new(Granularity::PerTask, 2)?;
/// let stats = aggregate(&table.view(), &config);
/// assert_eq!(stats.len(), 1);
/// assert!((stats[0].predicted_best_acc - 0.825).abs() < 1e-12);
/// assert!((stats[0].correlation.unwrap() - 1.0).abs() < 1e-12);
/// # Ok::<(), validator_sweep::Error>(())
/// ```
#[must_use]
pub fn aggregate(slice: &RecordSlice<'_>, config: &AggregateConfig) -> Vec<GroupStats> {
    partition(slice, config.granularity)
        .into_iter()
        .filter_map(|(key, rows)| {
            let pairs = ranked_pairs(&rows, RankBy::Score);
            let predicted_best_acc = top_n_mean(&pairs, config.top_n)?;
            let (scores, accs): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
            Some(GroupStats {
                key: key.to_owned_key(),
                correlation: spearman(&scores, &accs),
                predicted_best_acc,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RecordTable, TARGET_ACCURACY};

    fn row(validator: &str, adapter: &str, epoch: u64, score: f64, acc: f64) -> CheckpointRecord {
        CheckpointRecord::builder("office31", adapter, validator)
            .validator_args("layer_logits")
            .src_domains(["amazon"])
            .target_domains(["webcam"])
            .epoch(epoch)
            .score(score)
            .accuracy(TARGET_ACCURACY, acc)
            .build()
    }

    fn config(granularity: Granularity, top_n: usize) -> AggregateConfig {
        AggregateConfig::new(granularity, top_n).unwrap()
    }

    #[test]
    fn test_top_n_zero_rejected() {
        let err = AggregateConfig::new(Granularity::PerTask, 0).unwrap_err();
        assert!(err.to_string().contains("must be greater than 0"));
    }

    #[test]
    fn test_groups_in_first_occurrence_order() {
        let table = RecordTable::new(vec![
            row("SND", "DANNConfig", 0, 0.1, 0.5),
            row("IM", "DANNConfig", 0, 0.2, 0.5),
            row("SND", "DANNConfig", 1, 0.3, 0.6),
        ]);
        let stats = aggregate(&table.view(), &config(Granularity::PerTask, 1));
        let validators: Vec<&str> = stats.iter().map(|s| s.key.validator.as_str()).collect();
        assert_eq!(validators, vec!["SND", "IM"]);
    }

    #[test]
    fn test_single_row_group_keeps_top_n_without_correlation() {
        let table = RecordTable::new(vec![row("IM", "DANNConfig", 0, 0.2, 0.5)]);
        let stats = aggregate(&table.view(), &config(Granularity::PerTask, 5));
        assert_eq!(stats.len(), 1);
        assert!(stats[0].correlation.is_none());
        assert!((stats[0].predicted_best_acc - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_constant_score_has_no_correlation() {
        let table = RecordTable::new(vec![
            row("IM", "DANNConfig", 0, 0.2, 0.5),
            row("IM", "DANNConfig", 1, 0.2, 0.7),
        ]);
        let stats = aggregate(&table.view(), &config(Granularity::PerTask, 1));
        assert!(stats[0].correlation.is_none());
        // tie on score: the earlier row is selected
        assert!((stats[0].predicted_best_acc - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_undefined_rows_are_skipped() {
        let table = RecordTable::new(vec![
            row("IM", "DANNConfig", 0, f64::NAN, 0.99),
            row("IM", "DANNConfig", 1, 0.9, f64::NAN),
            row("IM", "DANNConfig", 2, 0.3, 0.4),
            row("IM", "DANNConfig", 3, 0.1, 0.2),
        ]);
        let stats = aggregate(&table.view(), &config(Granularity::PerTask, 1));
        assert!((stats[0].predicted_best_acc - 0.4).abs() < f64::EPSILON);
        assert!((stats[0].correlation.unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_group_with_no_usable_rows_is_omitted() {
        let table = RecordTable::new(vec![
            row("IM", "DANNConfig", 0, f64::NAN, 0.99),
            row("SND", "DANNConfig", 0, 0.5, 0.99),
        ]);
        let stats = aggregate(&table.view(), &config(Granularity::PerTask, 1));
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].key.validator, "SND");
    }

    #[test]
    fn test_per_adapter_splits_groups() {
        let table = RecordTable::new(vec![
            row("IM", "DANNConfig", 0, 0.9, 0.3),
            row("IM", "MCDConfig", 0, 0.1, 0.8),
        ]);
        let per_task = aggregate(&table.view(), &config(Granularity::PerTask, 1));
        let per_adapter = aggregate(&table.view(), &config(Granularity::PerTaskPerAdapter, 1));

        assert_eq!(per_task.len(), 1);
        assert!(per_task[0].key.adapter.is_none());
        assert!((per_task[0].predicted_best_acc - 0.3).abs() < f64::EPSILON);

        assert_eq!(per_adapter.len(), 2);
        assert_eq!(per_adapter[1].key.adapter.as_deref(), Some("MCDConfig"));
        assert!((per_adapter[1].predicted_best_acc - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rank_by_target_accuracy() {
        let table = RecordTable::new(vec![
            row("IM", "DANNConfig", 0, 0.9, 0.3),
            row("IM", "DANNConfig", 1, 0.1, 0.8),
            row("IM", "DANNConfig", 2, 0.5, 0.6),
        ]);
        let best = top_n_accuracy_by_group(
            &table.view(),
            &config(Granularity::PerTask, 2),
            RankBy::TargetAccuracy,
        );
        assert_eq!(best.len(), 1);
        assert!((best[0].1 - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_group_by_columns() {
        assert_eq!(Granularity::PerTask.group_by_columns().len(), 5);
        assert_eq!(
            Granularity::PerTaskPerAdapter.group_by_columns().last(),
            Some(&"adapter")
        );
        assert_eq!(Granularity::from_per_adapter(true), Granularity::PerTaskPerAdapter);
    }
}
