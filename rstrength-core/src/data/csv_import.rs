//! CSV import provider for offline runs.
//!
//! Layout: `{dir}/{code}.csv` with a header row. Required columns are `date`
//! and `close`; `volume` is optional (index files usually omit it). Dates may
//! be `YYYY-MM-DD` or `YYYYMMDD`. An optional `{dir}/names.csv` with columns
//! `code,name` supplies display names.

use super::dates::parse_flexible;
use super::provider::{
    clip_to_range, fallback_display_name, DataError, DataSource, MarketDataProvider,
};
use crate::domain::{DailyBar, IndexPoint};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    close: f64,
    #[serde(default)]
    volume: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct NameRow {
    code: String,
    name: String,
}

/// Reads series from a directory of CSV files.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, code: &str) -> PathBuf {
        self.dir.join(format!("{code}.csv"))
    }

    /// Load every row of `{code}.csv`, clipped to the range and sorted.
    fn load(&self, code: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<DailyBar>, DataError> {
        let path = self.path_for(code);
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: code.to_string(),
            });
        }

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|e| DataError::CsvError(format!("{}: {e}", path.display())))?;

        let mut bars = Vec::new();
        for (line, record) in reader.deserialize::<CsvRow>().enumerate() {
            let row = record.map_err(|e| {
                DataError::CsvError(format!("{} row {}: {e}", path.display(), line + 1))
            })?;
            let date = parse_flexible(&row.date)?;
            bars.push(DailyBar::new(date, row.close, row.volume.unwrap_or(0.0)));
        }

        debug!(code, rows = bars.len(), path = %path.display(), "loaded csv series");
        Ok(clip_to_range(bars, start, end, |b| b.date))
    }

    fn load_index(&self, code: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<IndexPoint>, DataError> {
        Ok(self
            .load(code, start, end)?
            .into_iter()
            .map(|b| IndexPoint::new(b.date, b.close))
            .collect())
    }

    fn lookup_name(&self, symbol: &str) -> Result<Option<String>, DataError> {
        let path = self.dir.join("names.csv");
        if !path.exists() {
            return Ok(None);
        }
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|e| DataError::CsvError(format!("{}: {e}", path.display())))?;
        for record in reader.deserialize::<NameRow>() {
            let row = record.map_err(|e| DataError::CsvError(e.to_string()))?;
            if row.code == symbol && !row.name.is_empty() {
                return Ok(Some(row.name));
            }
        }
        Ok(None)
    }
}

impl MarketDataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv_import"
    }

    fn source(&self) -> DataSource {
        DataSource::CsvImport
    }

    fn fetch_stock_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, DataError> {
        self.load(symbol, start, end)
    }

    fn fetch_industry_index(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<IndexPoint>, DataError> {
        self.load_index(code, start, end)
    }

    fn fetch_market_index(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<IndexPoint>, DataError> {
        self.load_index(code, start, end)
    }

    fn resolve_display_name(&self, symbol: &str) -> String {
        self.lookup_name(symbol)
            .ok()
            .flatten()
            .unwrap_or_else(|| fallback_display_name(symbol))
    }
}
