//! Threshold Filter
//!
//! Keeps checkpoints whose source-validation (or target-train) accuracy is
//! strictly above a minimum. Pure: the input slice is never modified.

use crate::record::{DomainType, RecordSlice};

/// Rows whose threshold accuracy for `domain` is strictly greater than `min_accuracy`.
///
/// A negative `min_accuracy` disables filtering and returns every row,
/// including rows whose accuracy is undefined. Otherwise rows with an
/// undefined accuracy never pass.
///
/// ```rust
/// use validator_sweep::filter::filter_by_accuracy;
/// use validator_sweep::record::{CheckpointRecord, DomainType, RecordTable};
///
/// let table: RecordTable = [0.2, 0.5, 0.8]
///     .into_iter()
///     .map(|acc| {
///         CheckpointRecord::builder("mnist", "DANNConfig", "IM")
///             .accuracy("src_val_macro", acc)
///             .build()
///     })
///     .collect();
///
/// let kept = filter_by_accuracy(&table.view(), 0.5, DomainType::Source);
/// assert_eq!(kept.len(), 1);
/// assert_eq!(filter_by_accuracy(&table.view(), -0.01, DomainType::Source).len(), 3);
/// ```
#[must_use]
pub fn filter_by_accuracy<'a>(
    slice: &RecordSlice<'a>,
    min_accuracy: f64,
    domain: DomainType,
) -> RecordSlice<'a> {
    if min_accuracy < 0.0 {
        return slice.clone();
    }
    slice.filter(|r| {
        r.threshold_accuracy(domain)
            .is_some_and(|acc| acc > min_accuracy)
    })
}

/// Apply several minimums in turn; a row must pass all of them.
#[must_use]
pub fn filter_by_accuracies<'a>(
    slice: &RecordSlice<'a>,
    minimums: &[(DomainType, f64)],
) -> RecordSlice<'a> {
    minimums
        .iter()
        .fold(slice.clone(), |current, &(domain, min_accuracy)| {
            filter_by_accuracy(&current, min_accuracy, domain)
        })
}
