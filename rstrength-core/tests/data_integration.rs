//! Integration tests for the data layer feeding the pipeline: CSV import,
//! the parquet TTL cache, and the concurrent fetch front end.

use chrono::{Datelike, NaiveDate, Weekday};
use rstrength_core::config::AnalysisConfig;
use rstrength_core::data::{
    CachedProvider, CsvProvider, DataError, DataSource, MarketDataProvider, SeriesCache,
    SyntheticProvider,
};
use rstrength_core::domain::{Advice, DailyBar, IndexPoint, SeriesKind};
use rstrength_core::error::{AnalysisError, MissingReason};
use rstrength_core::{run_analysis, AnalysisRequest};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn weekdays(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    start
        .iter_days()
        .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
        .take(count)
        .collect()
}

/// Write a `{code}.csv` with a rising stock and flat benchmarks.
fn write_fixture(dir: &Path) {
    let days = weekdays(d(2024, 4, 1), 40);

    let mut stock = String::from("date,close,volume\n");
    let mut industry = String::from("date,close\n");
    let mut market = String::from("date,close\n");
    for (i, day) in days.iter().enumerate() {
        writeln!(stock, "{},{:.2},{}", day.format("%Y-%m-%d"), 8.0 + 0.25 * i as f64, 120_000).unwrap();
        writeln!(industry, "{},{}", day.format("%Y%m%d"), 2_000.0).unwrap();
        writeln!(market, "{},{}", day.format("%Y-%m-%d"), 3_100.0).unwrap();
    }
    std::fs::write(dir.join("002530.csv"), stock).unwrap();
    std::fs::write(dir.join("801074.csv"), industry).unwrap();
    std::fs::write(dir.join("sz399001.csv"), market).unwrap();
    std::fs::write(dir.join("names.csv"), "code,name\n002530,Jinyi Holdings\n").unwrap();
}

#[test]
fn csv_directory_runs_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    write_fixture(tmp.path());

    let provider = CsvProvider::new(tmp.path());
    let request = AnalysisRequest::new("002530", "801074", d(2024, 4, 1), d(2024, 6, 30));
    let analysis = run_analysis(&provider, &request, &AnalysisConfig::default()).unwrap();

    assert_eq!(analysis.instrument.display_name, "Jinyi Holdings");
    assert_eq!(analysis.table.len(), 40);
    assert_eq!(analysis.advice.advice, Advice::StrongBullish);
    assert_eq!(analysis.signals.breakout.count(), 1);
}

#[test]
fn csv_range_clips_rows() {
    let tmp = tempfile::tempdir().unwrap();
    write_fixture(tmp.path());

    let provider = CsvProvider::new(tmp.path());
    let request = AnalysisRequest::new("002530", "801074", d(2024, 4, 8), d(2024, 4, 19));
    let analysis = run_analysis(&provider, &request, &AnalysisConfig::default()).unwrap();
    assert_eq!(analysis.table.len(), 10);
    assert_eq!(analysis.table.dates[0], d(2024, 4, 8));
}

#[test]
fn missing_industry_file_names_the_series() {
    let tmp = tempfile::tempdir().unwrap();
    write_fixture(tmp.path());
    std::fs::remove_file(tmp.path().join("801074.csv")).unwrap();

    let provider = CsvProvider::new(tmp.path());
    let request = AnalysisRequest::new("002530", "801074", d(2024, 4, 1), d(2024, 6, 30));
    match run_analysis(&provider, &request, &AnalysisConfig::default()) {
        Err(AnalysisError::MissingSource {
            series: SeriesKind::Industry,
            reason: MissingReason::Failed(DataError::SymbolNotFound { .. }),
        }) => {}
        other => panic!("expected missing industry source, got {other:?}"),
    }
}

// ── Cache ────────────────────────────────────────────────────────────

/// Synthetic data that counts upstream calls.
struct CountingProvider {
    inner: SyntheticProvider,
    calls: AtomicUsize,
}

impl CountingProvider {
    fn new() -> Self {
        Self {
            inner: SyntheticProvider::default(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl MarketDataProvider for CountingProvider {
    fn name(&self) -> &str {
        "counting"
    }

    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn fetch_stock_bars(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<DailyBar>, DataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_stock_bars(symbol, start, end)
    }

    fn fetch_industry_index(&self, code: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<IndexPoint>, DataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_industry_index(code, start, end)
    }

    fn fetch_market_index(&self, code: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<IndexPoint>, DataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_market_index(code, start, end)
    }
}

#[test]
fn second_run_is_served_from_cache() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = SeriesCache::new(tmp.path());
    let provider = CachedProvider::new(CountingProvider::new(), cache.clone(), Duration::from_secs(3600));
    let request = AnalysisRequest::new("600519", "801120", d(2024, 1, 1), d(2024, 5, 31));
    let config = AnalysisConfig::default();

    let first = run_analysis(&provider, &request, &config).unwrap();
    assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 3);

    let second = run_analysis(&provider, &request, &config).unwrap();
    assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 3);
    assert_eq!(first.fingerprint, second.fingerprint);

    let status = cache.status().unwrap();
    assert_eq!(status.len(), 3);
    assert!(status.iter().any(|s| s.kind == SeriesKind::Market && s.code == "sh000001"));
}

#[test]
fn expired_entries_are_refetched() {
    let tmp = tempfile::tempdir().unwrap();
    let provider = CachedProvider::new(CountingProvider::new(), SeriesCache::new(tmp.path()), Duration::ZERO);
    let request = AnalysisRequest::new("600519", "801120", d(2024, 1, 1), d(2024, 3, 31));
    let config = AnalysisConfig::default();

    run_analysis(&provider, &request, &config).unwrap();
    run_analysis(&provider, &request, &config).unwrap();
    assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 6);
}

#[test]
fn wider_request_misses_the_cache() {
    let tmp = tempfile::tempdir().unwrap();
    let provider = CachedProvider::new(CountingProvider::new(), SeriesCache::new(tmp.path()), Duration::from_secs(3600));
    let config = AnalysisConfig::default();

    let narrow = AnalysisRequest::new("600519", "801120", d(2024, 2, 1), d(2024, 3, 31));
    run_analysis(&provider, &narrow, &config).unwrap();
    let wide = AnalysisRequest::new("600519", "801120", d(2024, 1, 1), d(2024, 3, 31));
    run_analysis(&provider, &wide, &config).unwrap();
    assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 6);
}

#[test]
fn providers_sharing_a_cache_dir_keep_their_own_data() {
    let data = tempfile::tempdir().unwrap();
    write_fixture(data.path());
    let cache_dir = tempfile::tempdir().unwrap();
    let ttl = Duration::from_secs(3600);
    let (start, end) = (d(2024, 4, 1), d(2024, 4, 2));

    let synthetic = CachedProvider::new(SyntheticProvider::default(), SeriesCache::new(cache_dir.path()), ttl);
    let walk = synthetic.fetch_stock_bars("002530", start, end).unwrap();

    let csv = CachedProvider::new(CsvProvider::new(data.path()), SeriesCache::new(cache_dir.path()), ttl);
    let served: Vec<f64> = csv
        .fetch_stock_bars("002530", start, end)
        .unwrap()
        .iter()
        .map(|b| b.close)
        .collect();
    assert_eq!(served, vec![8.0, 8.25]);
    assert_ne!(served, walk.iter().map(|b| b.close).collect::<Vec<_>>());

    let status = SeriesCache::new(cache_dir.path()).status().unwrap();
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].source, DataSource::CsvImport);
}

#[test]
fn clear_empties_the_cache() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = SeriesCache::new(tmp.path());
    let provider = CachedProvider::new(CountingProvider::new(), cache.clone(), Duration::from_secs(3600));
    let request = AnalysisRequest::new("300750", "801730", d(2024, 1, 1), d(2024, 3, 31));
    run_analysis(&provider, &request, &AnalysisConfig::default()).unwrap();

    assert_eq!(cache.clear().unwrap(), 3);
    assert!(cache.status().unwrap().is_empty());
}
