//! RStrength Core — relative-strength analysis of one stock against its
//! industry and market benchmarks.
//!
//! - Domain types (daily bars, index points, advice)
//! - Data-fetch collaborators behind the `MarketDataProvider` trait, with a
//!   parquet TTL cache as a decorator
//! - The analysis pipeline: alignment, relative strength, Savitzky–Golay
//!   smoothing, extrema, breakout/volume signals, final-row advice
//! - A fetch-and-analyze front end that issues the three fetches concurrently

pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod fingerprint;
pub mod run;

pub use analysis::{analyze, Analysis};
pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use run::{run_analysis, AnalysisRequest};
