//! Final-row advice: smoothed industry-RS slope combined with price position.

use crate::domain::Advice;
use crate::error::{AnalysisError, Stage};
use serde::{Deserialize, Serialize};

/// The two inputs of the decision table, kept alongside the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdviceReading {
    pub advice: Advice,
    /// `S_RI[last] - S_RI[last - 1]`.
    pub slope: f64,
    /// Last close strictly above its moving average.
    pub is_above: bool,
}

/// Decision table over (slope rising, price above average).
pub fn classify(slope_rising: bool, is_above: bool) -> Advice {
    match (slope_rising, is_above) {
        (true, true) => Advice::StrongBullish,
        (true, false) => Advice::CautiousBullish,
        (false, true) => Advice::CautiousBullish,
        (false, false) => Advice::Cautious,
    }
}

/// Classify the last row.
///
/// `moving_average` is the raw average: a last row still in warmup counts
/// as not above.
pub fn advise(
    smooth_rs_industry: &[f64],
    close: &[f64],
    moving_average: &[Option<f64>],
) -> Result<AdviceReading, AnalysisError> {
    let n = smooth_rs_industry.len();
    if n < 2 || close.len() != n || moving_average.len() != n {
        return Err(AnalysisError::insufficient(Stage::Advice, 2, n.min(close.len())));
    }

    let slope = smooth_rs_industry[n - 1] - smooth_rs_industry[n - 2];
    let is_above = moving_average[n - 1].is_some_and(|ma| close[n - 1] > ma);

    Ok(AdviceReading {
        advice: classify(slope > 0.0, is_above),
        slope,
        is_above,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_table() {
        assert_eq!(classify(true, true), Advice::StrongBullish);
        assert_eq!(classify(true, false), Advice::CautiousBullish);
        assert_eq!(classify(false, true), Advice::CautiousBullish);
        assert_eq!(classify(false, false), Advice::Cautious);
    }

    #[test]
    fn rising_slope_above_average() {
        let reading = advise(&[0.1, 0.2], &[10.0, 12.0], &[None, Some(11.0)]).unwrap();
        assert_eq!(reading.advice, Advice::StrongBullish);
        assert!(reading.is_above);
        assert!((reading.slope - 0.1).abs() < 1e-12);
    }

    #[test]
    fn flat_slope_is_not_rising() {
        let reading = advise(&[0.2, 0.2], &[10.0, 9.0], &[None, Some(11.0)]).unwrap();
        assert_eq!(reading.advice, Advice::Cautious);
    }

    #[test]
    fn undefined_average_counts_as_below() {
        let reading = advise(&[0.3, 0.1], &[10.0, 50.0], &[None, None]).unwrap();
        assert!(!reading.is_above);
        assert_eq!(reading.advice, Advice::Cautious);
    }

    #[test]
    fn single_row_is_insufficient() {
        match advise(&[0.0], &[10.0], &[None]) {
            Err(AnalysisError::InsufficientData {
                stage: Stage::Advice,
                required: 2,
                actual: 1,
            }) => {}
            other => panic!("expected insufficient data, got {other:?}"),
        }
    }
}
