//! Relative strength against the industry and market benchmarks.
//!
//! Both the stock and the benchmark are normalized to their first aligned
//! value; relative strength is the difference of the two normalized curves.
//! A reading of 0.05 means the stock has outperformed by five percentage
//! points since the first row.

use super::align::AlignedTable;
use super::rolling::{fill_forward_backward, rolling_mean};
use crate::domain::SeriesKind;
use crate::error::{AnalysisError, Stage};
use serde::{Deserialize, Serialize};

/// Derived, unsmoothed series. Every vector has table length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelativeStrength {
    pub rs_industry: Vec<f64>,
    pub rs_market: Vec<f64>,
    /// Trailing mean of close; `None` during warmup.
    pub moving_average: Vec<Option<f64>>,
    /// `moving_average` with warmup gaps forward- then backward-filled.
    pub moving_average_filled: Vec<f64>,
}

/// Compute RS_I, RS_M and the close moving average for an aligned table.
pub fn relative_strength(table: &AlignedTable, ma_period: usize) -> Result<RelativeStrength, AnalysisError> {
    let p0 = table
        .rows()
        .first()
        .ok_or_else(|| AnalysisError::insufficient(Stage::Alignment, 1, 0))?;

    for (series, base) in [
        (SeriesKind::Stock, p0.close),
        (SeriesKind::Industry, p0.industry),
        (SeriesKind::Market, p0.market),
    ] {
        if base == 0.0 {
            return Err(AnalysisError::InvalidBaseline { series });
        }
    }

    let normalized_close: Vec<f64> = table.rows().iter().map(|r| r.close / p0.close).collect();
    let rs_industry = table
        .rows()
        .iter()
        .zip(&normalized_close)
        .map(|(r, c)| c - r.industry / p0.industry)
        .collect();
    let rs_market = table
        .rows()
        .iter()
        .zip(&normalized_close)
        .map(|(r, c)| c - r.market / p0.market)
        .collect();

    let moving_average = rolling_mean(&table.closes(), ma_period);
    let moving_average_filled = fill_forward_backward(&moving_average)
        .ok_or_else(|| AnalysisError::insufficient(Stage::MovingAverage, ma_period, table.len()))?;

    Ok(RelativeStrength {
        rs_industry,
        rs_market,
        moving_average,
        moving_average_filled,
    })
}
