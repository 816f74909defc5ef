//! The analysis table: aligned inputs plus every derived column.
//!
//! Stored column-wise because each stage consumes and produces whole series.
//! `rows()` gives the row view the renderer wants.

use super::align::AlignedTable;
use super::strength::RelativeStrength;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// All columns share one length and one row order (ascending date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisTable {
    pub dates: Vec<NaiveDate>,
    pub close: Vec<f64>,
    pub volume: Vec<f64>,
    pub industry: Vec<f64>,
    pub market: Vec<f64>,

    pub rs_industry: Vec<f64>,
    pub rs_market: Vec<f64>,
    pub moving_average: Vec<Option<f64>>,
    pub moving_average_filled: Vec<f64>,

    pub smooth_rs_industry: Vec<f64>,
    pub smooth_rs_market: Vec<f64>,
    pub smooth_moving_average: Vec<f64>,
    pub smooth_close: Vec<f64>,
}

/// Smoothed counterparts of the four series that get smoothed.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedSeries {
    pub rs_industry: Vec<f64>,
    pub rs_market: Vec<f64>,
    pub moving_average: Vec<f64>,
    pub close: Vec<f64>,
}

/// One row of the table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRow {
    pub date: NaiveDate,
    pub close: f64,
    pub volume: f64,
    pub industry: f64,
    pub market: f64,
    pub rs_industry: f64,
    pub rs_market: f64,
    pub moving_average: Option<f64>,
    pub smooth_rs_industry: f64,
    pub smooth_rs_market: f64,
    pub smooth_moving_average: f64,
    pub smooth_close: f64,
}

impl AnalysisTable {
    pub fn assemble(aligned: &AlignedTable, strength: RelativeStrength, smoothed: SmoothedSeries) -> Self {
        Self {
            dates: aligned.dates(),
            close: aligned.closes(),
            volume: aligned.volumes(),
            industry: aligned.industry(),
            market: aligned.market(),
            rs_industry: strength.rs_industry,
            rs_market: strength.rs_market,
            moving_average: strength.moving_average,
            moving_average_filled: strength.moving_average_filled,
            smooth_rs_industry: smoothed.rs_industry,
            smooth_rs_market: smoothed.rs_market,
            smooth_moving_average: smoothed.moving_average,
            smooth_close: smoothed.close,
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn row(&self, i: usize) -> Option<AnalysisRow> {
        Some(AnalysisRow {
            date: *self.dates.get(i)?,
            close: self.close[i],
            volume: self.volume[i],
            industry: self.industry[i],
            market: self.market[i],
            rs_industry: self.rs_industry[i],
            rs_market: self.rs_market[i],
            moving_average: self.moving_average[i],
            smooth_rs_industry: self.smooth_rs_industry[i],
            smooth_rs_market: self.smooth_rs_market[i],
            smooth_moving_average: self.smooth_moving_average[i],
            smooth_close: self.smooth_close[i],
        })
    }

    pub fn rows(&self) -> Vec<AnalysisRow> {
        (0..self.len()).filter_map(|i| self.row(i)).collect()
    }
}
