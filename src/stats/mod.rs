//! Statistics over `(score, accuracy)` pairs
//!
//! - [`spearman`]: rank correlation with average ranks for ties
//! - [`top_n_indices`] / [`top_n_mean`]: bounded-heap top-N selection,
//!   O(n log N), stable among tied scores

mod spearman;
mod topk;

pub use spearman::{average_ranks, spearman};
pub use topk::{top_n_indices, top_n_mean};

/// Arithmetic mean; `None` for an empty input.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Round half to even at `decimals` places.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}
