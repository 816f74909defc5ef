//! Fetch-and-analyze front end.
//!
//! Resolves the market benchmark, fetches the three series concurrently,
//! waits for all of them, then hands the in-memory inputs to `analyze`.

use crate::analysis::{analyze, Analysis};
use crate::config::AnalysisConfig;
use crate::data::{DataError, MarketDataProvider, MarketIndex};
use crate::domain::{Code, Instrument, SeriesKind, SourceSeries};
use crate::error::AnalysisError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// What to analyse and over which dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub symbol: Code,
    /// Industry index code (Shenwan classification).
    pub industry: Code,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Market index code; derived from the symbol when absent.
    pub market: Option<Code>,
}

impl AnalysisRequest {
    pub fn new(symbol: impl Into<Code>, industry: impl Into<Code>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            industry: industry.into(),
            start,
            end,
            market: None,
        }
    }

    pub fn with_market(mut self, code: impl Into<Code>) -> Self {
        self.market = Some(code.into());
        self
    }

    /// Market index code the request will be measured against.
    pub fn market_code(&self) -> Code {
        self.market
            .clone()
            .unwrap_or_else(|| MarketIndex::for_symbol(&self.symbol).code().to_string())
    }
}

/// Fetch all three series through `provider` and analyse them.
///
/// Any fetch that fails or comes back empty aborts the run with
/// `MissingSource` before alignment. Stock, industry and market are checked
/// in that order, so the reported series is stable when several fail.
pub fn run_analysis(
    provider: &dyn MarketDataProvider,
    request: &AnalysisRequest,
    config: &AnalysisConfig,
) -> Result<Analysis, AnalysisError> {
    if request.start > request.end {
        return Err(AnalysisError::Config(format!(
            "start date {} is after end date {}",
            request.start, request.end
        )));
    }

    let market_code = request.market_code();
    info!(
        provider = provider.name(),
        symbol = %request.symbol,
        industry = %request.industry,
        market = %market_code,
        start = %request.start,
        end = %request.end,
        "fetching series"
    );

    let (stock, (industry, market)) = rayon::join(
        || provider.fetch_stock_bars(&request.symbol, request.start, request.end),
        || {
            rayon::join(
                || provider.fetch_industry_index(&request.industry, request.start, request.end),
                || provider.fetch_market_index(&market_code, request.start, request.end),
            )
        },
    );

    let inputs = SourceSeries::new(
        require(SeriesKind::Stock, stock)?,
        require(SeriesKind::Industry, industry)?,
        require(SeriesKind::Market, market)?,
    );

    let instrument = Instrument::new(
        request.symbol.clone(),
        provider.resolve_display_name(&request.symbol),
    );
    analyze(instrument, &inputs, config)
}

/// Unwrap one fetch, turning errors and empty answers into `MissingSource`.
fn require<T>(kind: SeriesKind, fetched: Result<Vec<T>, DataError>) -> Result<Vec<T>, AnalysisError> {
    match fetched {
        Ok(rows) if rows.is_empty() => {
            warn!(series = %kind, "fetch returned no rows");
            Err(AnalysisError::empty(kind))
        }
        Ok(rows) => Ok(rows),
        Err(e) => {
            warn!(series = %kind, error = %e, "fetch failed");
            Err(AnalysisError::failed(kind, e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataSource, SyntheticProvider};
    use crate::domain::{DailyBar, IndexPoint};
    use crate::error::MissingReason;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn range() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        )
    }

    #[test]
    fn market_code_follows_symbol_unless_overridden() {
        let (start, end) = range();
        let req = AnalysisRequest::new("002530", "801074", start, end);
        assert_eq!(req.market_code(), "sz399001");
        assert_eq!(req.with_market("sh000300").market_code(), "sh000300");
    }

    #[test]
    fn synthetic_run_completes() {
        let (start, end) = range();
        let req = AnalysisRequest::new("600519", "801120", start, end);
        let analysis = run_analysis(&SyntheticProvider::default(), &req, &AnalysisConfig::default()).unwrap();
        assert_eq!(analysis.instrument.display_name, "Synthetic(600519)");
        assert!(analysis.table.len() > 100);
        assert!(analysis.as_of <= end);
    }

    #[test]
    fn reversed_range_is_rejected() {
        let (start, end) = range();
        let req = AnalysisRequest::new("600519", "801120", end, start);
        let err = run_analysis(&SyntheticProvider::default(), &req, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::Config(_)));
    }

    /// Industry fetch is empty, market fetch fails; every call is counted.
    struct PartialProvider {
        calls: AtomicUsize,
    }

    impl MarketDataProvider for PartialProvider {
        fn name(&self) -> &str {
            "partial"
        }

        fn source(&self) -> DataSource {
            DataSource::Synthetic
        }

        fn fetch_stock_bars(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<DailyBar>, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            SyntheticProvider::default().fetch_stock_bars(symbol, start, end)
        }

        fn fetch_industry_index(&self, _code: &str, _start: NaiveDate, _end: NaiveDate) -> Result<Vec<IndexPoint>, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        fn fetch_market_index(&self, _code: &str, _start: NaiveDate, _end: NaiveDate) -> Result<Vec<IndexPoint>, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(DataError::NetworkUnreachable("timed out".into()))
        }
    }

    #[test]
    fn all_fetches_finish_before_the_first_missing_source_is_reported() {
        let provider = PartialProvider {
            calls: AtomicUsize::new(0),
        };
        let (start, end) = range();
        let req = AnalysisRequest::new("600519", "801120", start, end);
        let err = run_analysis(&provider, &req, &AnalysisConfig::default()).unwrap_err();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
        assert!(matches!(
            err,
            AnalysisError::MissingSource {
                series: SeriesKind::Industry,
                reason: MissingReason::Empty,
            }
        ));
    }
}
