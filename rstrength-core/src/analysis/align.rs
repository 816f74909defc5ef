//! Three-way date alignment.
//!
//! Stock bars are inner-joined with the industry index, and the result with
//! the market index. Only dates present in all three survive; there is no
//! forward-fill of prices across calendar gaps.

use crate::domain::{SeriesKind, SourceSeries};
use crate::error::{AnalysisError, Stage};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// One joined trading day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignedRow {
    pub date: NaiveDate,
    /// Stock close.
    pub close: f64,
    /// Stock volume.
    pub volume: f64,
    /// Industry index close.
    pub industry: f64,
    /// Market index close.
    pub market: f64,
}

impl AlignedRow {
    fn is_finite(&self) -> bool {
        self.close.is_finite()
            && self.volume.is_finite()
            && self.industry.is_finite()
            && self.market.is_finite()
    }
}

/// Joined rows, strictly ascending by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedTable {
    rows: Vec<AlignedRow>,
}

impl AlignedTable {
    pub fn rows(&self) -> &[AlignedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.volume).collect()
    }

    pub fn industry(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.industry).collect()
    }

    pub fn market(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.market).collect()
    }
}

/// Inner-join the three series on date.
///
/// Fails with `MissingSource` if any input is empty (checked in stock,
/// industry, market order), `Alignment` if they share no date, and
/// `InsufficientData` if fewer than `min_rows` rows survive.
///
/// When a series repeats a date, its first occurrence wins. Rows with a
/// non-finite value in any column are dropped.
pub fn align_series(inputs: &SourceSeries, min_rows: usize) -> Result<AlignedTable, AnalysisError> {
    for kind in SeriesKind::ALL {
        if inputs.len_of(kind) == 0 {
            return Err(AnalysisError::empty(kind));
        }
    }

    let industry = first_close_by_date(inputs.industry.iter().map(|p| (p.date, p.close)));
    let market = first_close_by_date(inputs.market.iter().map(|p| (p.date, p.close)));

    let mut stock = inputs.stock.clone();
    stock.sort_by_key(|b| b.date);
    stock.dedup_by_key(|b| b.date);

    let joined: Vec<AlignedRow> = stock
        .iter()
        .filter_map(|bar| {
            let industry = *industry.get(&bar.date)?;
            let market = *market.get(&bar.date)?;
            Some(AlignedRow {
                date: bar.date,
                close: bar.close,
                volume: bar.volume,
                industry,
                market,
            })
        })
        .collect();

    if joined.is_empty() {
        return Err(AnalysisError::Alignment);
    }

    let common = joined.len();
    let rows: Vec<AlignedRow> = joined.into_iter().filter(AlignedRow::is_finite).collect();
    debug!(
        stock = inputs.stock.len(),
        industry = inputs.industry.len(),
        market = inputs.market.len(),
        common,
        dropped_void = common - rows.len(),
        "aligned series"
    );

    if rows.len() < min_rows {
        return Err(AnalysisError::insufficient(Stage::Alignment, min_rows, rows.len()));
    }

    Ok(AlignedTable { rows })
}

fn first_close_by_date(points: impl Iterator<Item = (NaiveDate, f64)>) -> HashMap<NaiveDate, f64> {
    let mut map = HashMap::new();
    for (date, close) in points {
        map.entry(date).or_insert(close);
    }
    map
}
