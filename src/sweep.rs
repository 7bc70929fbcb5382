//! Sweep Driver
//!
//! For each task slice and each threshold on a fixed grid, filters the slice
//! by `baseline * threshold`, aggregates what survives, and tags the rows
//! with the threshold. Task slices are independent and are processed in
//! parallel when the `rayon` feature is enabled; results are concatenated in
//! slice order either way.
//!
//! Grid: [`NO_FILTER_SENTINEL`] followed by [`GRID_STEPS`] evenly spaced
//! points over `[0, GRID_UPPER_BOUND]`.

#[cfg(feature = "rayon")]
use rayon::prelude::*;
use tracing::{debug, info};

use crate::aggregate::{aggregate, AggregateConfig};
use crate::baseline::BaselineOracle;
use crate::filter::filter_by_accuracies;
use crate::record::{DomainType, RecordSlice, RecordTable, Task};
use crate::report::{SweepReport, ThresholdRow, ThresholdTable};
use crate::stats::round_to;
use crate::{Error, Result};

/// Largest threshold fraction on the grid.
pub const GRID_UPPER_BOUND: f64 = 2.0;

/// Number of evenly spaced grid points over `[0, GRID_UPPER_BOUND]`.
pub const GRID_STEPS: usize = 201;

/// Threshold that disables filtering; always the first grid point.
pub const NO_FILTER_SENTINEL: f64 = -0.01;

const MIN_ACCURACY_DECIMALS: i32 = 4;
const THRESHOLD_DECIMALS: i32 = 2;

/// Threshold fractions in sweep order: the sentinel, then `0.00, 0.01, .., 2.00`.
///
/// ```rust
/// use validator_sweep::sweep::{threshold_grid, NO_FILTER_SENTINEL};
///
/// let grid = threshold_grid();
/// assert_eq!(grid.len(), 202);
/// assert_eq!(grid[0], NO_FILTER_SENTINEL);
/// assert_eq!(grid[1], 0.0);
/// assert_eq!(grid[201], 2.0);
/// ```
#[must_use]
pub fn threshold_grid() -> Vec<f64> {
    let last = GRID_STEPS - 1;
    #[allow(clippy::cast_precision_loss)]
    let points = (0..GRID_STEPS).map(|i| {
        if i == last {
            GRID_UPPER_BOUND
        } else {
            i as f64 * GRID_UPPER_BOUND / last as f64
        }
    });
    std::iter::once(NO_FILTER_SENTINEL).chain(points).collect()
}

/// Minimum accuracy for `baseline` at grid point `threshold`, rounded to 4 decimals.
///
/// At a negative threshold the result is always negative: a zero (or tiny)
/// baseline would otherwise round the sentinel into a real `0.0` cutoff.
#[must_use]
pub fn min_accuracy(baseline: f64, threshold: f64) -> f64 {
    let min = round_to(baseline * threshold, MIN_ACCURACY_DECIMALS);
    if threshold < 0.0 && min >= 0.0 {
        threshold
    } else {
        min
    }
}

/// Domains whose accuracies a sweep filters on, with their baselines.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdAxis {
    components: Vec<(DomainType, f64)>,
}

impl ThresholdAxis {
    /// Axis over a single domain.
    #[must_use]
    pub fn single(domain: DomainType, baseline: f64) -> Self {
        Self {
            components: vec![(domain, baseline)],
        }
    }

    /// Axis over several domains at once; a row must pass every component.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `components` is empty or repeats a domain
    pub fn joint(components: Vec<(DomainType, f64)>) -> Result<Self> {
        if components.is_empty() {
            return Err(Error::InvalidInput(
                "Threshold axis needs at least one domain".to_string(),
            ));
        }
        for (i, (domain, _)) in components.iter().enumerate() {
            if components[..i].iter().any(|(d, _)| d == domain) {
                return Err(Error::InvalidInput(format!(
                    "Threshold axis repeats domain {domain}"
                )));
            }
        }
        Ok(Self { components })
    }

    /// Build an axis for `task` from oracle baselines.
    ///
    /// # Errors
    ///
    /// Propagates oracle lookup errors
    pub fn from_oracle<O: BaselineOracle + ?Sized>(
        oracle: &O,
        task: &Task,
        domains: &[DomainType],
    ) -> Result<Self> {
        let components = domains
            .iter()
            .map(|&d| oracle.threshold_baseline(task, d).map(|b| (d, b)))
            .collect::<Result<Vec<_>>>()?;
        Self::joint(components)
    }

    /// Domains and baselines, in filter order.
    #[must_use]
    pub fn components(&self) -> &[(DomainType, f64)] {
        &self.components
    }

    /// Threshold column name, e.g. `src_threshold` or `src_target_threshold`.
    #[must_use]
    pub fn column_name(&self) -> String {
        column_name(self.components.iter().map(|(d, _)| *d))
    }

    /// Minimum accuracy per component at `threshold`.
    #[must_use]
    pub fn minimums(&self, threshold: f64) -> Vec<(DomainType, f64)> {
        self.components
            .iter()
            .map(|&(domain, baseline)| (domain, min_accuracy(baseline, threshold)))
            .collect()
    }
}

fn column_name(domains: impl Iterator<Item = DomainType>) -> String {
    let prefix: Vec<&str> = domains.map(DomainType::as_str).collect();
    format!("{}_threshold", prefix.join("_"))
}

/// Sweep one slice along `axis`.
///
/// Grid points whose filtered slice is empty emit nothing. Rows come out in
/// grid order, then group first-occurrence order.
///
/// # Errors
///
/// Returns [`Error::SentinelMismatch`] if the sentinel grid point does not
/// keep every row of `slice`
pub fn sweep(
    slice: &RecordSlice<'_>,
    axis: &ThresholdAxis,
    config: &AggregateConfig,
) -> Result<ThresholdTable> {
    let mut rows = Vec::new();

    for threshold in threshold_grid() {
        let minimums = axis.minimums(threshold);
        let filtered = filter_by_accuracies(slice, &minimums);

        if threshold < 0.0 && filtered.len() != slice.len() {
            return Err(Error::SentinelMismatch {
                expected: slice.len(),
                actual: filtered.len(),
            });
        }

        if filtered.is_empty() {
            debug!(threshold, ?minimums, "no rows pass threshold, skipping");
            continue;
        }

        let tag = round_to(threshold, THRESHOLD_DECIMALS);
        rows.extend(
            aggregate(&filtered, config)
                .into_iter()
                .map(|stats| ThresholdRow::from_stats(stats, tag)),
        );
    }

    Ok(ThresholdTable::new(axis.column_name(), config.granularity(), rows))
}

/// Sweep every task slice of `table` along the axis built from `domains`.
///
/// # Errors
///
/// Propagates oracle lookup errors and [`Error::SentinelMismatch`]
pub fn sweep_tasks<O: BaselineOracle + ?Sized>(
    table: &RecordTable,
    oracle: &O,
    domains: &[DomainType],
    config: &AggregateConfig,
) -> Result<ThresholdTable> {
    let column = column_name(domains.iter().copied());
    let slices = table.view().partition_by_task();

    let run = |(task, slice): &(Task, RecordSlice<'_>)| -> Result<ThresholdTable> {
        let axis = ThresholdAxis::from_oracle(oracle, task, domains)?;
        info!(
            task = %task,
            rows = slice.len(),
            axis = %column,
            "sweeping task slice"
        );
        sweep(slice, &axis, config)
    };

    #[cfg(feature = "rayon")]
    let tables = slices.par_iter().map(run).collect::<Result<Vec<_>>>()?;
    #[cfg(not(feature = "rayon"))]
    let tables = slices.iter().map(run).collect::<Result<Vec<_>>>()?;

    ThresholdTable::concat(column, config.granularity(), tables)
}

/// Sweep both axes: source-validation and target-train thresholds.
///
/// # Errors
///
/// Propagates oracle lookup errors and [`Error::SentinelMismatch`]
pub fn per_threshold<O: BaselineOracle + ?Sized>(
    table: &RecordTable,
    oracle: &O,
    config: &AggregateConfig,
) -> Result<SweepReport> {
    info!(
        rows = table.len(),
        top_n = config.top_n(),
        granularity = ?config.granularity(),
        "starting threshold sweep"
    );
    let per_src = sweep_tasks(table, oracle, &[DomainType::Source], config)?;
    let per_target = sweep_tasks(table, oracle, &[DomainType::Target], config)?;
    info!(
        src_rows = per_src.len(),
        target_rows = per_target.len(),
        "threshold sweep finished"
    );
    Ok(SweepReport {
        per_src,
        per_target,
    })
}
