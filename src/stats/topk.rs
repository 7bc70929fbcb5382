//! Top-N selection
//!
//! **Problem**: picking the N best-scoring checkpoints by full sort is
//! O(n log n) per group, per grid point.
//!
//! **Solution**: bounded min-heap holding the current N best, O(n log N).
//!
//! Tie-break: among equal values the row that comes first wins, so the
//! selection always has exactly `min(n, defined rows)` entries and does not
//! depend on hash or sort-library order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

// Heap item: the "worst" kept row sits at the top (lowest value, latest index)
#[derive(Debug)]
struct MinHeapItem {
    value: f64,
    index: usize,
}

impl PartialEq for MinHeapItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MinHeapItem {}

impl Ord for MinHeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse value comparison for min-heap; later index is worse among ties
        other
            .value
            .total_cmp(&self.value)
            .then_with(|| self.index.cmp(&other.index))
    }
}

impl PartialOrd for MinHeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Indices of the `n` largest finite values, best first.
///
/// Non-finite values are skipped. Returns fewer than `n` indices when fewer
/// finite values exist, and nothing when `n == 0`.
///
/// ```rust
/// use validator_sweep::stats::top_n_indices;
///
/// let top = top_n_indices(&[0.5, 0.9, 0.9, f64::NAN, 0.1], 2);
/// assert_eq!(top, vec![1, 2]);
/// ```
#[must_use]
pub fn top_n_indices(values: &[f64], n: usize) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }
    let mut heap: BinaryHeap<MinHeapItem> = BinaryHeap::with_capacity(n.min(values.len()));

    for (index, &value) in values.iter().enumerate() {
        if !value.is_finite() {
            continue;
        }
        let item = MinHeapItem { value, index };
        if heap.len() < n {
            heap.push(item);
        } else if let Some(top) = heap.peek() {
            if item < *top {
                heap.pop();
                heap.push(item);
            }
        }
    }

    // Ascending in heap order is best first
    let mut result = heap.into_vec();
    result.sort_unstable();
    result.into_iter().map(|item| item.index).collect()
}

/// Mean of `value` over the `n` pairs with the largest `key`.
///
/// Pairs are `(key, value)`; pairs with a non-finite key or value are
/// skipped. `None` when no pair is usable.
#[must_use]
pub fn top_n_mean(pairs: &[(f64, f64)], n: usize) -> Option<f64> {
    let usable: Vec<(f64, f64)> = pairs
        .iter()
        .copied()
        .filter(|(k, v)| k.is_finite() && v.is_finite())
        .collect();
    let keys: Vec<f64> = usable.iter().map(|&(k, _)| k).collect();
    let selected: Vec<f64> = top_n_indices(&keys, n)
        .into_iter()
        .map(|i| usable[i].1)
        .collect();
    super::mean(&selected)
}
