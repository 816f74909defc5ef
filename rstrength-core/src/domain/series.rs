//! Raw daily series — the inputs every run starts from.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Daily close and volume for the analysed instrument.
///
/// Volume is carried as `f64`: upstream providers report it in lots or shares
/// depending on the venue, and the pipeline only ever averages it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub close: f64,
    pub volume: f64,
}

impl DailyBar {
    pub fn new(date: NaiveDate, close: f64, volume: f64) -> Self {
        Self {
            date,
            close,
            volume,
        }
    }

    /// True when close or volume is not a finite number.
    pub fn is_void(&self) -> bool {
        !self.close.is_finite() || !self.volume.is_finite()
    }
}

/// Daily close of a benchmark index (industry or broad market).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexPoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl IndexPoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }

    pub fn is_void(&self) -> bool {
        !self.close.is_finite()
    }
}

/// Which of the three input series a value or error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    Stock,
    Industry,
    Market,
}

impl SeriesKind {
    pub const ALL: [SeriesKind; 3] = [SeriesKind::Stock, SeriesKind::Industry, SeriesKind::Market];

    /// Stable lowercase tag, used in cache paths and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesKind::Stock => "stock",
            SeriesKind::Industry => "industry",
            SeriesKind::Market => "market",
        }
    }
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three raw series for one run, as handed to the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceSeries {
    pub stock: Vec<DailyBar>,
    pub industry: Vec<IndexPoint>,
    pub market: Vec<IndexPoint>,
}

impl SourceSeries {
    pub fn new(stock: Vec<DailyBar>, industry: Vec<IndexPoint>, market: Vec<IndexPoint>) -> Self {
        Self {
            stock,
            industry,
            market,
        }
    }

    /// Number of points in the given series.
    pub fn len_of(&self, kind: SeriesKind) -> usize {
        match kind {
            SeriesKind::Stock => self.stock.len(),
            SeriesKind::Industry => self.industry.len(),
            SeriesKind::Market => self.market.len(),
        }
    }
}
