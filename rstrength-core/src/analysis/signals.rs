//! Discrete event masks: moving-average breakouts and volume anomalies.
//!
//! Both masks are aligned 1:1 with the analysis table. Each row looks only
//! at itself and the previous row, so row 0 is always false.

use super::rolling::rolling_mean;
use serde::{Deserialize, Serialize};

/// Per-row event flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalMask(Vec<bool>);

impl SignalMask {
    pub fn flags(&self) -> &[bool] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Rows where the event fired.
    pub fn indices(&self) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, &hit)| hit.then_some(i))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&hit| hit).count()
    }
}

/// Close crosses from at-or-below the average to strictly above it.
///
/// `average` must have no gaps; callers pass the filled moving average.
pub fn breakout_mask(close: &[f64], average: &[f64]) -> SignalMask {
    debug_assert_eq!(close.len(), average.len());
    let mut mask = vec![false; close.len()];
    for i in 1..close.len() {
        mask[i] = close[i] > average[i] && close[i - 1] <= average[i - 1];
    }
    SignalMask(mask)
}

/// Volume spikes above `multiplier` times its trailing mean on an up day.
///
/// Rows inside the volume-average warmup are false.
pub fn volume_anomaly_mask(close: &[f64], volume: &[f64], period: usize, multiplier: f64) -> SignalMask {
    debug_assert_eq!(close.len(), volume.len());
    let mean = rolling_mean(volume, period);
    let mut mask = vec![false; close.len()];
    for i in 1..close.len() {
        if let Some(avg) = mean[i] {
            mask[i] = volume[i] > multiplier * avg && close[i] > close[i - 1];
        }
    }
    SignalMask(mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakout_fires_on_the_crossing_row_only() {
        let close = [9.0, 9.5, 10.5, 11.0, 9.0, 10.2];
        let average = [10.0; 6];
        let mask = breakout_mask(&close, &average);
        assert_eq!(mask.indices(), vec![2, 5]);
        assert_eq!(mask.len(), 6);
    }

    #[test]
    fn touching_the_average_counts_as_below() {
        let close = [10.0, 10.0, 10.1];
        let average = [10.0, 10.0, 10.0];
        assert_eq!(breakout_mask(&close, &average).indices(), vec![2]);
    }

    #[test]
    fn row_zero_never_fires() {
        let mask = breakout_mask(&[20.0, 21.0], &[10.0, 10.0]);
        assert_eq!(mask.flags(), &[false, false]);
    }

    #[test]
    fn always_below_is_all_false() {
        let close: Vec<f64> = (0..30).map(|i| 5.0 + (i % 3) as f64).collect();
        let average = vec![100.0; 30];
        assert_eq!(breakout_mask(&close, &average).count(), 0);
    }

    #[test]
    fn volume_spike_on_up_day() {
        let close = [10.0, 10.1, 10.2, 10.3, 10.4, 10.5, 10.4];
        let volume = [100.0, 100.0, 100.0, 100.0, 100.0, 500.0, 500.0];
        let mask = volume_anomaly_mask(&close, &volume, 5, 1.8);
        // Row 5: mean(100,100,100,100,500) = 180, 500 > 324 on an up day.
        // Row 6: mean 260, 500 > 468, but close fell.
        assert_eq!(mask.indices(), vec![5]);
    }

    #[test]
    fn warmup_rows_are_false() {
        let close = [1.0, 2.0, 3.0, 4.0];
        let volume = [1.0, 1000.0, 1000.0, 1000.0];
        assert_eq!(volume_anomaly_mask(&close, &volume, 5, 1.8).count(), 0);
    }

    #[test]
    fn volume_equal_to_threshold_does_not_fire() {
        let close = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let flat = [1.0; 6];
        assert_eq!(volume_anomaly_mask(&close, &flat, 5, 1.0).count(), 0);

        let mut bumped = flat;
        bumped[5] = 1.5;
        assert_eq!(volume_anomaly_mask(&close, &bumped, 5, 1.0).indices(), vec![5]);
    }
}
