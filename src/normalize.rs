//! Relative Accuracy Normalizer
//!
//! Turns absolute top-N accuracies into fractions of the best achievable
//! top-N accuracy for the same group, computed over the unfiltered table.
//!
//! Applying [`normalize`] twice divides twice; callers normalize once.

use rustc_hash::FxHashMap;
use tracing::warn;

use crate::aggregate::{top_n_accuracy_by_group, AggregateConfig, GroupKey, RankBy};
use crate::record::RecordSlice;
use crate::report::{ThresholdRow, ThresholdTable};
use crate::{Error, Result};

/// Best achievable top-N target accuracy per group.
///
/// Ranks rows by target accuracy itself; rows with an undefined target
/// accuracy are ignored, the validator score plays no part.
#[must_use]
pub fn best_accuracy(slice: &RecordSlice<'_>, config: &AggregateConfig) -> Vec<(GroupKey, f64)> {
    top_n_accuracy_by_group(slice, config, RankBy::TargetAccuracy)
}

/// Divide every `predicted_best_acc` of `table` by its group's best accuracy.
///
/// `best_acc` is filled in for every row whose group has a best accuracy.
/// The ratio is `None` when the group has no best accuracy or it is zero.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if `config` groups at a different
/// granularity than `table`
#[allow(clippy::float_cmp)]
pub fn normalize(
    table: ThresholdTable,
    full: &RecordSlice<'_>,
    config: &AggregateConfig,
) -> Result<ThresholdTable> {
    if table.granularity() != config.granularity() {
        return Err(Error::InvalidInput(format!(
            "Cannot normalize a {:?} table with {:?} best accuracies",
            table.granularity(),
            config.granularity()
        )));
    }

    let best: FxHashMap<GroupKey, f64> = best_accuracy(full, config).into_iter().collect();
    for (key, _) in best.iter().filter(|(_, &acc)| acc == 0.0) {
        warn!(
            validator = %key.validator,
            task = %key.task,
            "best achievable accuracy is zero, relative accuracy undefined"
        );
    }

    let rows: Vec<ThresholdRow> = table
        .rows()
        .iter()
        .map(|row| {
            let best_acc = best.get(&row.key).copied();
            let predicted_best_acc = match (row.predicted_best_acc, best_acc) {
                (Some(acc), Some(best)) if best != 0.0 => Some(acc / best),
                _ => None,
            };
            ThresholdRow {
                predicted_best_acc,
                best_acc,
                ..row.clone()
            }
        })
        .collect();

    Ok(table.into_normalized(rows))
}
