//! Parquet cache for fetched series, with a time-to-live.
//!
//! Layout: `{cache_dir}/{kind}={CODE}/series.parquet` plus a `meta.json`
//! sidecar recording the requested range, row count, data hash and fetch time.
//!
//! - Atomic writes (write to .tmp, rename into place)
//! - Entries expire after the TTL or when they don't cover the requested range
//! - Entries written by a different provider are never served
//! - Codes are validated before they become directory names
//! - Corrupt files are quarantined (`series.parquet.quarantined`) and refetched
//!
//! The analysis pipeline never sees this layer: `CachedProvider` wraps any
//! `MarketDataProvider` and is itself a `MarketDataProvider`.

use super::provider::{fetch_as_bars, DataError, DataSource, MarketDataProvider};
use crate::domain::{DailyBar, IndexPoint, SeriesKind};
use chrono::{DateTime, NaiveDate, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Metadata sidecar for one cached series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMeta {
    pub kind: SeriesKind,
    pub code: String,
    /// Range that was requested from the upstream provider.
    pub requested_start: NaiveDate,
    pub requested_end: NaiveDate,
    pub row_count: usize,
    pub data_hash: String,
    pub source: DataSource,
    pub cached_at: DateTime<Utc>,
}

impl CacheMeta {
    /// True when the entry is younger than `ttl` at `now` and covers the range.
    pub fn is_fresh_for(&self, start: NaiveDate, end: NaiveDate, now: DateTime<Utc>, ttl: Duration) -> bool {
        let age = now.signed_duration_since(self.cached_at);
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(36_500));
        age >= chrono::Duration::zero()
            && age < ttl
            && self.requested_start <= start
            && self.requested_end >= end
    }
}

/// Cache status for one entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatus {
    pub kind: SeriesKind,
    pub code: String,
    pub source: DataSource,
    pub row_count: usize,
    pub requested_start: NaiveDate,
    pub requested_end: NaiveDate,
    pub cached_at: DateTime<Utc>,
}

/// The on-disk series cache.
#[derive(Debug, Clone)]
pub struct SeriesCache {
    cache_dir: PathBuf,
}

impl SeriesCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Root directory of the cache.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Directory for one entry: `{cache_dir}/{kind}={CODE}/`
    fn entry_dir(&self, kind: SeriesKind, code: &str) -> Result<PathBuf, DataError> {
        validate_code(code)?;
        Ok(self.cache_dir.join(format!("{kind}={code}")))
    }

    fn data_path(&self, kind: SeriesKind, code: &str) -> Result<PathBuf, DataError> {
        Ok(self.entry_dir(kind, code)?.join("series.parquet"))
    }

    fn meta_path(&self, kind: SeriesKind, code: &str) -> Result<PathBuf, DataError> {
        Ok(self.entry_dir(kind, code)?.join("meta.json"))
    }

    /// Write a fetched series to the cache.
    pub fn write(
        &self,
        kind: SeriesKind,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
        source: DataSource,
        bars: &[DailyBar],
    ) -> Result<(), DataError> {
        if bars.is_empty() {
            return Err(DataError::CacheError("no rows to cache".into()));
        }

        let dir = self.entry_dir(kind, code)?;
        fs::create_dir_all(&dir)
            .map_err(|e| DataError::CacheError(format!("failed to create dir: {e}")))?;

        // Drop the old sidecar first: until the new one lands, the entry reads as missing.
        let meta_path = self.meta_path(kind, code)?;
        match fs::remove_file(&meta_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(DataError::CacheError(format!("remove stale meta: {e}"))),
        }

        let df = bars_to_dataframe(bars)?;
        let path = self.data_path(kind, code)?;
        let tmp_path = path.with_extension("parquet.tmp");
        write_parquet(&df, &tmp_path)?;
        rename_into_place(&tmp_path, &path)?;

        let meta = CacheMeta {
            kind,
            code: code.to_string(),
            requested_start: start,
            requested_end: end,
            row_count: bars.len(),
            data_hash: hash_bars(bars)?,
            source,
            cached_at: Utc::now(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| DataError::CacheError(format!("meta serialization: {e}")))?;
        let tmp_meta = meta_path.with_extension("json.tmp");
        fs::write(&tmp_meta, meta_json)
            .map_err(|e| DataError::CacheError(format!("meta write: {e}")))?;
        rename_into_place(&tmp_meta, &meta_path)
    }

    /// Load a cached series, sorted by date ascending.
    ///
    /// A file that fails validation is quarantined and reported as missing.
    pub fn load(&self, kind: SeriesKind, code: &str) -> Result<Vec<DailyBar>, DataError> {
        let path = self.data_path(kind, code)?;
        let key = format!("{kind}={code}");
        if !path.exists() {
            return Err(DataError::NoCachedData { key });
        }

        match load_and_validate_parquet(&path) {
            Ok(mut bars) => {
                bars.sort_by_key(|b| b.date);
                Ok(bars)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "quarantining corrupt cache file");
                let _ = fs::rename(&path, path.with_extension("parquet.quarantined"));
                let _ = fs::remove_file(path.with_file_name("meta.json"));
                Err(DataError::NoCachedData { key })
            }
        }
    }

    pub fn get_meta(&self, kind: SeriesKind, code: &str) -> Option<CacheMeta> {
        let content = fs::read_to_string(self.meta_path(kind, code).ok()?).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Return the cached rows inside `[start, end]` if a fresh entry written
    /// by `source` covers it.
    pub fn lookup(
        &self,
        kind: SeriesKind,
        code: &str,
        source: DataSource,
        start: NaiveDate,
        end: NaiveDate,
        ttl: Duration,
    ) -> Option<Vec<DailyBar>> {
        let meta = self.get_meta(kind, code)?;
        if meta.source != source {
            debug!(%kind, code, cached = ?meta.source, requested = ?source, "cache entry from another source");
            return None;
        }
        if !meta.is_fresh_for(start, end, Utc::now(), ttl) {
            debug!(%kind, code, "cache entry stale or out of range");
            return None;
        }
        let bars = self.load(kind, code).ok()?;
        Some(
            bars.into_iter()
                .filter(|b| b.date >= start && b.date <= end)
                .collect(),
        )
    }

    /// All entries with a readable sidecar, sorted by kind then code.
    pub fn status(&self) -> Result<Vec<CacheStatus>, DataError> {
        if !self.cache_dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.cache_dir)
            .map_err(|e| DataError::CacheError(format!("read dir: {e}")))?;

        let mut statuses = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DataError::CacheError(format!("dir entry: {e}")))?;
            let meta_path = entry.path().join("meta.json");
            let Ok(content) = fs::read_to_string(&meta_path) else {
                continue;
            };
            let Ok(meta) = serde_json::from_str::<CacheMeta>(&content) else {
                continue;
            };
            statuses.push(CacheStatus {
                kind: meta.kind,
                code: meta.code,
                source: meta.source,
                row_count: meta.row_count,
                requested_start: meta.requested_start,
                requested_end: meta.requested_end,
                cached_at: meta.cached_at,
            });
        }
        statuses.sort_by(|a, b| (a.kind.as_str(), &a.code).cmp(&(b.kind.as_str(), &b.code)));
        Ok(statuses)
    }

    /// Remove every entry. Returns how many entry directories were deleted.
    pub fn clear(&self) -> Result<usize, DataError> {
        if !self.cache_dir.exists() {
            return Ok(0);
        }
        let entries = fs::read_dir(&self.cache_dir)
            .map_err(|e| DataError::CacheError(format!("read dir: {e}")))?;
        let mut removed = 0;
        for entry in entries {
            let path = entry
                .map_err(|e| DataError::CacheError(format!("dir entry: {e}")))?
                .path();
            if path.is_dir() {
                fs::remove_dir_all(&path)
                    .map_err(|e| DataError::CacheError(format!("remove {}: {e}", path.display())))?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// A provider decorator that serves fresh cache entries and writes through
/// on misses.
pub struct CachedProvider<P> {
    inner: P,
    cache: SeriesCache,
    ttl: Duration,
}

impl<P: MarketDataProvider> CachedProvider<P> {
    pub fn new(inner: P, cache: SeriesCache, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    fn fetch_cached(
        &self,
        kind: SeriesKind,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, DataError> {
        let source = self.inner.source();
        if let Some(bars) = self.cache.lookup(kind, code, source, start, end, self.ttl) {
            debug!(%kind, code, rows = bars.len(), "cache hit");
            return Ok(bars);
        }

        let bars = fetch_as_bars(&self.inner, kind, code, start, end)?;
        if bars.is_empty() {
            return Ok(bars);
        }
        // A failed write only costs a refetch next run.
        match self.cache.write(kind, code, start, end, source, &bars) {
            Ok(()) => info!(%kind, code, rows = bars.len(), "cached fetched series"),
            Err(e) => warn!(%kind, code, error = %e, "cache write failed"),
        }
        Ok(bars)
    }

    fn fetch_index(
        &self,
        kind: SeriesKind,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<IndexPoint>, DataError> {
        Ok(self
            .fetch_cached(kind, code, start, end)?
            .into_iter()
            .map(|b| IndexPoint::new(b.date, b.close))
            .collect())
    }
}

impl<P: MarketDataProvider> MarketDataProvider for CachedProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn source(&self) -> DataSource {
        self.inner.source()
    }

    fn fetch_stock_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, DataError> {
        self.fetch_cached(SeriesKind::Stock, symbol, start, end)
    }

    fn fetch_industry_index(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<IndexPoint>, DataError> {
        self.fetch_index(SeriesKind::Industry, code, start, end)
    }

    fn fetch_market_index(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<IndexPoint>, DataError> {
        self.fetch_index(SeriesKind::Market, code, start, end)
    }

    fn resolve_display_name(&self, symbol: &str) -> String {
        self.inner.resolve_display_name(symbol)
    }
}

/// Codes become directory names, so only plain identifiers are accepted.
fn validate_code(code: &str) -> Result<(), DataError> {
    let plain = !code.is_empty()
        && !code.starts_with('.')
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if plain {
        Ok(())
    } else {
        Err(DataError::CacheError(format!("invalid code for cache key: '{code}'")))
    }
}

fn rename_into_place(tmp: &Path, path: &Path) -> Result<(), DataError> {
    fs::rename(tmp, path).map_err(|e| {
        let _ = fs::remove_file(tmp);
        DataError::CacheError(format!("atomic rename failed: {e}"))
    })
}

fn hash_bars(bars: &[DailyBar]) -> Result<String, DataError> {
    let bytes = serde_json::to_vec(bars)
        .map_err(|e| DataError::CacheError(format!("hash serialization: {e}")))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

fn epoch() -> NaiveDate {
    NaiveDate::default()
}

fn bars_to_dataframe(bars: &[DailyBar]) -> Result<DataFrame, DataError> {
    let dates: Vec<i32> = bars
        .iter()
        .map(|b| (b.date - epoch()).num_days() as i32)
        .collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();

    DataFrame::new(vec![
        Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| DataError::ParquetError(format!("date cast: {e}")))?,
        Column::new("close".into(), closes),
        Column::new("volume".into(), volumes),
    ])
    .map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))
}

fn write_parquet(df: &DataFrame, path: &Path) -> Result<(), DataError> {
    let file =
        fs::File::create(path).map_err(|e| DataError::ParquetError(format!("create file: {e}")))?;
    ParquetWriter::new(file)
        .finish(&mut df.clone())
        .map_err(|e| DataError::ParquetError(format!("write parquet: {e}")))?;
    Ok(())
}

fn load_and_validate_parquet(path: &Path) -> Result<Vec<DailyBar>, DataError> {
    let file = fs::File::open(path).map_err(|e| DataError::ParquetError(format!("open: {e}")))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::ParquetError(format!("read: {e}")))?;

    if df.height() == 0 {
        return Err(DataError::CacheError("empty parquet file".into()));
    }

    let map_err = |e: PolarsError| DataError::ParquetError(format!("column read: {e}"));
    let date_ca = df
        .column("date")
        .map_err(map_err)?
        .date()
        .map_err(|e| DataError::ParquetError(format!("date column type: {e}")))?;
    let close_ca = df
        .column("close")
        .map_err(map_err)?
        .f64()
        .map_err(|e| DataError::ParquetError(format!("close column type: {e}")))?;
    let vol_ca = df
        .column("volume")
        .map_err(map_err)?
        .f64()
        .map_err(|e| DataError::ParquetError(format!("volume column type: {e}")))?;

    let n = df.height();
    let mut bars = Vec::with_capacity(n);
    for i in 0..n {
        let days = date_ca
            .get(i)
            .ok_or_else(|| DataError::ParquetError(format!("null date at row {i}")))?;
        bars.push(DailyBar::new(
            epoch() + chrono::Duration::days(days as i64),
            close_ca.get(i).unwrap_or(f64::NAN),
            vol_ca.get(i).unwrap_or(0.0),
        ));
    }
    Ok(bars)
}
