//! Local turning points of a smoothed series.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Row indices of local maxima and minima, ascending and duplicate-free.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtremaSet(Vec<usize>);

impl ExtremaSet {
    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.0.binary_search(&index).is_ok()
    }
}

/// Indices `i` in `1..n-1` where `series[i]` is strictly above or strictly
/// below both neighbors. Endpoints and flat plateaus never qualify, and a
/// NaN neighbor fails every comparison.
pub fn find_extrema(series: &[f64]) -> ExtremaSet {
    let maxima = series
        .windows(3)
        .enumerate()
        .filter(|(_, w)| w[1] > w[0] && w[1] > w[2])
        .map(|(i, _)| i + 1);
    let minima = series
        .windows(3)
        .enumerate()
        .filter(|(_, w)| w[1] < w[0] && w[1] < w[2])
        .map(|(i, _)| i + 1);

    let merged: BTreeSet<usize> = maxima.chain(minima).collect();
    ExtremaSet(merged.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peaks_and_troughs_are_merged_in_order() {
        let series = [1.0, 3.0, 2.0, 0.5, 4.0, 4.5, 1.0];
        let set = find_extrema(&series);
        assert_eq!(set.indices(), &[1, 3, 5]);
        assert!(set.contains(3));
        assert!(!set.contains(4));
    }

    #[test]
    fn monotone_series_has_none() {
        let up: Vec<f64> = (0..20).map(|i| i as f64 * 0.3).collect();
        assert!(find_extrema(&up).is_empty());
        let down: Vec<f64> = up.iter().rev().copied().collect();
        assert!(find_extrema(&down).is_empty());
    }

    #[test]
    fn plateau_is_not_an_extremum() {
        assert!(find_extrema(&[1.0, 2.0, 2.0, 1.0]).is_empty());
        assert!(find_extrema(&[5.0, 5.0, 5.0]).is_empty());
    }

    #[test]
    fn short_inputs() {
        assert!(find_extrema(&[]).is_empty());
        assert!(find_extrema(&[1.0, 2.0]).is_empty());
        assert_eq!(find_extrema(&[0.0, 1.0, 0.0]).indices(), &[1]);
    }

    #[test]
    fn serializes_as_plain_array() {
        let set = find_extrema(&[0.0, 1.0, 0.0, 1.0]);
        assert_eq!(serde_json::to_string(&set).unwrap(), "[1,2]");
    }
}
