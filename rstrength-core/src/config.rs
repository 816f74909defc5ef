//! Serializable analysis configuration.
//!
//! Every tuning constant of the pipeline lives here so a run is fully
//! described by its inputs plus one `AnalysisConfig`. All sections default to
//! the stock values, so an empty TOML file is a valid configuration:
//!
//! ```toml
//! [smoothing]
//! degree = 3
//! long_window = 15      # used when length > long_threshold
//! medium_window = 5     # used when short_threshold < length <= long_threshold
//! short_window = 3      # used when length <= short_threshold
//! long_threshold = 30
//! short_threshold = 10
//!
//! [signals]
//! ma_period = 5
//! volume_period = 5
//! volume_multiplier = 1.8
//!
//! [alignment]
//! min_aligned_rows = 6
//!
//! [cache]
//! dir = "data/cache"
//! ttl_secs = 3600
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Smoothing filter parameters and the length-based window policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Local polynomial degree.
    pub degree: usize,
    pub long_window: usize,
    pub medium_window: usize,
    pub short_window: usize,
    pub long_threshold: usize,
    pub short_threshold: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            degree: 3,
            long_window: 15,
            medium_window: 5,
            short_window: 3,
            long_threshold: 30,
            short_threshold: 10,
        }
    }
}

impl SmoothingConfig {
    /// Window the policy selects for a series of `len` points (before clamping).
    pub fn window_for(&self, len: usize) -> usize {
        if len > self.long_threshold {
            self.long_window
        } else if len > self.short_threshold {
            self.medium_window
        } else {
            self.short_window
        }
    }
}

/// Event-detection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Trailing window of the price moving average.
    pub ma_period: usize,
    /// Trailing window of the volume average.
    pub volume_period: usize,
    /// Volume must exceed this multiple of its trailing average.
    pub volume_multiplier: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            ma_period: 5,
            volume_period: 5,
            volume_multiplier: 1.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Fewer joined rows than this aborts the run.
    pub min_aligned_rows: usize,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            min_aligned_rows: 6,
        }
    }
}

/// Settings for the fetch cache. Only the data layer reads these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub dir: PathBuf,
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/cache"),
            ttl_secs: 3600,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub smoothing: SmoothingConfig,
    pub signals: SignalConfig,
    pub alignment: AlignmentConfig,
    pub cache: CacheConfig,
}

impl AnalysisConfig {
    /// Load and validate a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AnalysisConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.smoothing;
        if s.degree == 0 {
            return Err(ConfigError::Invalid("smoothing.degree must be >= 1".into()));
        }
        for (name, window) in [
            ("long_window", s.long_window),
            ("medium_window", s.medium_window),
            ("short_window", s.short_window),
        ] {
            if window < 3 || window % 2 == 0 {
                return Err(ConfigError::Invalid(format!(
                    "smoothing.{name} must be odd and >= 3, got {window}"
                )));
            }
        }
        if s.short_threshold >= s.long_threshold {
            return Err(ConfigError::Invalid(
                "smoothing.short_threshold must be below long_threshold".into(),
            ));
        }

        let sig = &self.signals;
        if sig.ma_period == 0 || sig.volume_period == 0 {
            return Err(ConfigError::Invalid(
                "signals.ma_period and signals.volume_period must be >= 1".into(),
            ));
        }
        if !sig.volume_multiplier.is_finite() || sig.volume_multiplier <= 0.0 {
            return Err(ConfigError::Invalid(
                "signals.volume_multiplier must be a positive number".into(),
            ));
        }

        if self.alignment.min_aligned_rows < 2 {
            return Err(ConfigError::Invalid(
                "alignment.min_aligned_rows must be >= 2".into(),
            ));
        }
        Ok(())
    }
}
