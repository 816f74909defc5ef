//! RStrength CLI — relative-strength analysis and cache management.
//!
//! Commands:
//! - `analyze` — fetch stock, industry and market series and print the advice
//! - `cache status` — list cached series with their ranges and ages
//! - `cache clear` — delete every cached series

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use rstrength_core::config::AnalysisConfig;
use rstrength_core::data::{
    format_yyyymmdd, parse_flexible, CachedProvider, CsvProvider, EastmoneyProvider,
    MarketDataProvider, SeriesCache, SyntheticProvider,
};
use rstrength_core::{run_analysis, Analysis, AnalysisRequest};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Calendar days analysed when `--start` is omitted.
const DEFAULT_LOOKBACK_DAYS: i64 = 150;

#[derive(Parser)]
#[command(
    name = "rstrength",
    about = "RStrength CLI — relative strength against industry and market"
)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Source {
    /// Eastmoney k-line and Shenwan index APIs.
    Eastmoney,
    /// A directory of `{code}.csv` files.
    Csv,
    /// Deterministic random walks, for demos.
    Synthetic,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse one stock against its industry and market benchmarks.
    Analyze {
        /// Stock code, e.g. 002530.
        #[arg(long)]
        symbol: String,

        /// Shenwan industry index code, e.g. 801074.
        #[arg(long)]
        industry: String,

        /// Market index code. Defaults to the symbol's exchange benchmark.
        #[arg(long)]
        market: Option<String>,

        /// Start date (YYYYMMDD). Defaults to 150 days before the end date.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYYMMDD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Path to a TOML analysis config.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Where to fetch series from.
        #[arg(long, value_enum, default_value_t = Source::Eastmoney)]
        source: Source,

        /// Directory of CSV files (required with --source csv).
        #[arg(long)]
        csv_dir: Option<PathBuf>,

        /// Cache directory. Defaults to the config's `[cache] dir`.
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Bypass the series cache.
        #[arg(long, default_value_t = false)]
        no_cache: bool,

        /// Write the full analysis as JSON to this path.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// List cached series.
    Status {
        #[command(flatten)]
        location: CacheLocation,
    },
    /// Delete every cached series.
    Clear {
        #[command(flatten)]
        location: CacheLocation,
    },
}

/// Which cache directory a cache command works on.
#[derive(clap::Args)]
struct CacheLocation {
    /// Cache directory. Defaults to the config's `[cache] dir`.
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Path to a TOML analysis config.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl CacheLocation {
    /// `--cache-dir` wins, then the config file, then the built-in default.
    fn resolve(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.cache_dir {
            return Ok(dir.clone());
        }
        Ok(load_config(self.config.as_deref())?.cache.dir)
    }
}

/// Everything `analyze` needs once arguments are resolved.
struct AnalyzeJob {
    request: AnalysisRequest,
    config: AnalysisConfig,
    cache_dir: Option<PathBuf>,
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Analyze {
            symbol,
            industry,
            market,
            start,
            end,
            config,
            source,
            csv_dir,
            cache_dir,
            no_cache,
            output,
        } => {
            let config = load_config(config.as_deref())?;
            let (start, end) = resolve_range(start.as_deref(), end.as_deref())?;
            let mut request = AnalysisRequest::new(symbol, industry, start, end);
            if let Some(code) = market {
                request = request.with_market(code);
            }
            let cache_dir = if no_cache {
                None
            } else {
                Some(cache_dir.unwrap_or_else(|| config.cache.dir.clone()))
            };
            let job = AnalyzeJob {
                request,
                config,
                cache_dir,
                output,
            };

            match source {
                Source::Eastmoney => run_analyze(EastmoneyProvider::new()?, &job),
                Source::Csv => {
                    let Some(dir) = csv_dir else {
                        bail!("--csv-dir is required with --source csv");
                    };
                    if !dir.is_dir() {
                        bail!("CSV directory does not exist: {}", dir.display());
                    }
                    run_analyze(CsvProvider::new(dir), &job)
                }
                Source::Synthetic => run_analyze(SyntheticProvider::default(), &job),
            }
        }
        Commands::Cache { action } => match action {
            CacheAction::Status { location } => run_cache_status(&location.resolve()?),
            CacheAction::Clear { location } => run_cache_clear(&location.resolve()?),
        },
    }
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(AnalysisConfig::default()),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_range(start: Option<&str>, end: Option<&str>) -> Result<(NaiveDate, NaiveDate)> {
    let end = match end {
        Some(s) => parse_flexible(s)?,
        None => Local::now().date_naive(),
    };
    let start = match start {
        Some(s) => parse_flexible(s)?,
        None => end - chrono::Duration::days(DEFAULT_LOOKBACK_DAYS),
    };
    if start > end {
        bail!(
            "start date {} is after end date {}",
            format_yyyymmdd(start),
            format_yyyymmdd(end)
        );
    }
    Ok((start, end))
}

fn run_analyze<P: MarketDataProvider>(provider: P, job: &AnalyzeJob) -> Result<()> {
    let analysis = match &job.cache_dir {
        Some(dir) => {
            debug!(dir = %dir.display(), ttl_secs = job.config.cache.ttl_secs, "using series cache");
            let cached = CachedProvider::new(provider, SeriesCache::new(dir), job.config.cache.ttl());
            run_analysis(&cached, &job.request, &job.config)?
        }
        None => run_analysis(&provider, &job.request, &job.config)?,
    };

    print_summary(&analysis);

    if let Some(path) = &job.output {
        let json = serde_json::to_string_pretty(&analysis)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "analysis written");
        println!("Analysis saved to: {}", path.display());
    }
    Ok(())
}

fn print_summary(a: &Analysis) {
    let t = &a.table;
    println!(
        "{} ({})  as of {}",
        a.instrument.display_name, a.instrument.symbol, a.as_of
    );
    println!("Rows analysed: {}", t.len());
    if let (Some(rs_i), Some(rs_m)) = (t.rs_industry.last(), t.rs_market.last()) {
        println!("RS vs industry: {:+.4}   RS vs market: {:+.4}", rs_i, rs_m);
    }
    println!();
    println!("Advice: {}  [{}]", a.advice.advice, a.advice.advice.color());
    println!(
        "  smoothed RS slope {:+.5}, close {} 5-day average",
        a.advice.slope,
        if a.advice.is_above { "above" } else { "at or below" }
    );
    println!();
    println!(
        "Turning points: {} (RS industry), {} (RS market), {} (moving average)",
        a.extrema.rs_industry.len(),
        a.extrema.rs_market.len(),
        a.extrema.moving_average.len()
    );
    println!("Breakouts:        {}", format_dates(&t.dates, &a.signals.breakout.indices()));
    println!("Volume anomalies: {}", format_dates(&t.dates, &a.signals.volume_anomaly.indices()));
    println!();
    println!("Fingerprint: {}", a.fingerprint.short());
}

/// Last few event dates, most recent last.
fn format_dates(dates: &[NaiveDate], indices: &[usize]) -> String {
    const SHOWN: usize = 5;
    if indices.is_empty() {
        return "none".into();
    }
    let tail = &indices[indices.len().saturating_sub(SHOWN)..];
    let listed: Vec<String> = tail
        .iter()
        .filter_map(|&i| dates.get(i))
        .map(|d| d.to_string())
        .collect();
    if indices.len() > SHOWN {
        format!("{} total, latest {}", indices.len(), listed.join(", "))
    } else {
        listed.join(", ")
    }
}

fn run_cache_status(cache_dir: &Path) -> Result<()> {
    let cache = SeriesCache::new(cache_dir);
    let entries = cache.status()?;
    if entries.is_empty() {
        println!("Cache is empty: {}", cache_dir.display());
        return Ok(());
    }

    let now = chrono::Utc::now();
    println!("Cache: {}", cache_dir.display());
    println!("Entries: {}", entries.len());
    println!();
    println!(
        "{:<10} {:<10} {:<11} {:<23} {:>6} {:>10}",
        "Kind", "Code", "Source", "Range", "Rows", "Age"
    );
    println!("{}", "-".repeat(75));
    for e in &entries {
        let age = now.signed_duration_since(e.cached_at);
        println!(
            "{:<10} {:<10} {:<11} {:<23} {:>6} {:>10}",
            e.kind.as_str(),
            e.code,
            format!("{:?}", e.source),
            format!("{} to {}", format_yyyymmdd(e.requested_start), format_yyyymmdd(e.requested_end)),
            e.row_count,
            format_age(age),
        );
    }
    Ok(())
}

fn run_cache_clear(cache_dir: &Path) -> Result<()> {
    let removed = SeriesCache::new(cache_dir).clear()?;
    println!("Removed {removed} cached series from {}", cache_dir.display());
    Ok(())
}

fn format_age(age: chrono::Duration) -> String {
    let secs = age.num_seconds().max(0);
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86_400 {
        format!("{}h", secs / 3600)
    } else {
        format!("{}d", secs / 86_400)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_range_is_parsed() {
        let (start, end) = resolve_range(Some("20240102"), Some("2024-06-28")).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 6, 28).unwrap());
    }

    #[test]
    fn default_start_is_lookback_before_end() {
        let (start, end) = resolve_range(None, Some("20240630")).unwrap();
        assert_eq!((end - start).num_days(), DEFAULT_LOOKBACK_DAYS);
    }

    #[test]
    fn reversed_range_is_an_error() {
        assert!(resolve_range(Some("20240630"), Some("20240101")).is_err());
    }

    #[test]
    fn event_dates_are_truncated() {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates: Vec<NaiveDate> = (0..10).map(|i| base + chrono::Duration::days(i)).collect();
        assert_eq!(format_dates(&dates, &[]), "none");
        assert_eq!(format_dates(&dates, &[1]), "2024-01-02");
        let many = format_dates(&dates, &[0, 1, 2, 3, 4, 5, 6]);
        assert!(many.starts_with("7 total, latest 2024-01-03"));
    }

    #[test]
    fn cache_commands_read_the_config_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("rs.toml");
        std::fs::write(&config_path, "[cache]\ndir = \"/srv/rs-cache\"\n").unwrap();
        let config_arg = config_path.to_str().unwrap();

        let cli = Cli::try_parse_from(["rstrength", "cache", "status", "--config", config_arg]).unwrap();
        let Commands::Cache { action: CacheAction::Status { location } } = cli.command else {
            panic!("expected cache status");
        };
        assert_eq!(location.resolve().unwrap(), PathBuf::from("/srv/rs-cache"));

        let cli = Cli::try_parse_from([
            "rstrength", "cache", "clear", "--config", config_arg, "--cache-dir", "elsewhere",
        ])
        .unwrap();
        let Commands::Cache { action: CacheAction::Clear { location } } = cli.command else {
            panic!("expected cache clear");
        };
        assert_eq!(location.resolve().unwrap(), PathBuf::from("elsewhere"));
    }

    #[test]
    fn cache_dir_defaults_to_the_built_in_config() {
        let cli = Cli::try_parse_from(["rstrength", "cache", "status"]).unwrap();
        let Commands::Cache { action: CacheAction::Status { location } } = cli.command else {
            panic!("expected cache status");
        };
        assert_eq!(location.resolve().unwrap(), AnalysisConfig::default().cache.dir);
    }

    #[test]
    fn cli_parses_analyze() {
        let cli = Cli::try_parse_from([
            "rstrength", "analyze", "--symbol", "002530", "--industry", "801074", "--source", "synthetic",
            "--no-cache",
        ])
        .unwrap();
        match cli.command {
            Commands::Analyze { symbol, source, no_cache, .. } => {
                assert_eq!(symbol, "002530");
                assert!(matches!(source, Source::Synthetic));
                assert!(no_cache);
            }
            _ => panic!("expected analyze"),
        }
    }
}
