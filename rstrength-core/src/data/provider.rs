//! Data provider trait and structured error types.
//!
//! The `MarketDataProvider` trait abstracts over data sources (Eastmoney/Shenwan
//! HTTP, CSV import, synthetic) so the pipeline can be fed from any of them and
//! mocked in tests. Caching sits above this trait as a decorator; providers
//! don't know about the cache.

use crate::domain::{DailyBar, IndexPoint, SeriesKind};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error types for data operations.
///
/// A failed fetch is always reported through one of these, never as an empty
/// series, so callers can tell "nothing traded" from "provider broke".
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("invalid date '{0}': expected YYYYMMDD or YYYY-MM-DD")]
    InvalidDate(String),

    #[error("csv error: {0}")]
    CsvError(String),

    #[error("cache error: {0}")]
    CacheError(String),

    #[error("parquet I/O error: {0}")]
    ParquetError(String),

    #[error("no cached data for '{key}'")]
    NoCachedData { key: String },

    #[error("data error: {0}")]
    Other(String),
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Eastmoney,
    CsvImport,
    Cache,
    Synthetic,
}

/// Placeholder display name used when a provider cannot resolve one.
pub fn fallback_display_name(symbol: &str) -> String {
    format!("Instrument({symbol})")
}

/// Trait for the data-fetch collaborator.
///
/// Implementations return series sorted ascending by date. An empty `Ok`
/// vector means the provider answered with no rows in the range.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    fn source(&self) -> DataSource;

    /// Daily close/volume of an individual stock (back-adjusted prices).
    fn fetch_stock_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, DataError>;

    /// Daily close of an industry index (Shenwan classification codes).
    fn fetch_industry_index(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<IndexPoint>, DataError>;

    /// Daily close of a broad-market index (e.g. "sh000001").
    fn fetch_market_index(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<IndexPoint>, DataError>;

    /// Best-effort human name for a symbol. Never fails.
    fn resolve_display_name(&self, symbol: &str) -> String {
        fallback_display_name(symbol)
    }
}

/// Fetch any of the three series kinds as bar-shaped rows.
///
/// Index series come back with zero volume. Used by layers that treat all
/// three series uniformly (the cache).
pub fn fetch_as_bars(
    provider: &dyn MarketDataProvider,
    kind: SeriesKind,
    code: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<DailyBar>, DataError> {
    let index_to_bars = |points: Vec<IndexPoint>| -> Vec<DailyBar> {
        points
            .into_iter()
            .map(|p| DailyBar::new(p.date, p.close, 0.0))
            .collect()
    };
    match kind {
        SeriesKind::Stock => provider.fetch_stock_bars(code, start, end),
        SeriesKind::Industry => provider
            .fetch_industry_index(code, start, end)
            .map(index_to_bars),
        SeriesKind::Market => provider
            .fetch_market_index(code, start, end)
            .map(index_to_bars),
    }
}

/// Keep only rows inside `[start, end]`, sorted ascending with the first
/// occurrence of each date.
pub(crate) fn clip_to_range<T, F>(mut rows: Vec<T>, start: NaiveDate, end: NaiveDate, date_of: F) -> Vec<T>
where
    F: Fn(&T) -> NaiveDate,
{
    rows.retain(|r| {
        let d = date_of(r);
        d >= start && d <= end
    });
    rows.sort_by_key(|r| date_of(r));
    rows.dedup_by_key(|r| date_of(r));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    struct FixedProvider;

    impl MarketDataProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        fn source(&self) -> DataSource {
            DataSource::Synthetic
        }

        fn fetch_stock_bars(
            &self,
            _symbol: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<DailyBar>, DataError> {
            Ok(vec![DailyBar::new(day(2), 10.0, 100.0)])
        }

        fn fetch_industry_index(
            &self,
            _code: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<IndexPoint>, DataError> {
            Ok(vec![IndexPoint::new(day(2), 1000.0)])
        }

        fn fetch_market_index(
            &self,
            code: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<IndexPoint>, DataError> {
            Err(DataError::SymbolNotFound {
                symbol: code.to_string(),
            })
        }
    }

    #[test]
    fn default_display_name_is_placeholder() {
        assert_eq!(FixedProvider.resolve_display_name("002530"), "Instrument(002530)");
    }

    #[test]
    fn fetch_as_bars_zeroes_index_volume() {
        let bars = fetch_as_bars(&FixedProvider, SeriesKind::Industry, "801074", day(1), day(9)).unwrap();
        assert_eq!(bars, vec![DailyBar::new(day(2), 1000.0, 0.0)]);
    }

    #[test]
    fn fetch_as_bars_propagates_errors() {
        let err = fetch_as_bars(&FixedProvider, SeriesKind::Market, "sh000001", day(1), day(9)).unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { .. }));
    }

    #[test]
    fn clip_sorts_dedups_and_filters() {
        let rows = vec![
            IndexPoint::new(day(5), 5.0),
            IndexPoint::new(day(1), 1.0),
            IndexPoint::new(day(3), 3.0),
            IndexPoint::new(day(3), 33.0),
            IndexPoint::new(day(9), 9.0),
        ];
        let clipped = clip_to_range(rows, day(2), day(6), |p| p.date);
        let closes: Vec<f64> = clipped.iter().map(|p| p.close).collect();
        assert_eq!(closes, vec![3.0, 5.0]);
    }
}
