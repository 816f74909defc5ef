//! Errors raised by the analysis pipeline.
//!
//! Every variant is terminal for the current run. Messages are written to be
//! shown to the end user verbatim.

use crate::data::DataError;
use crate::domain::SeriesKind;
use std::fmt;
use thiserror::Error;

/// Why a required input series is missing.
#[derive(Debug, Error)]
pub enum MissingReason {
    /// The provider answered, but with no rows in the requested range.
    #[error("no rows returned")]
    Empty,

    /// The provider failed outright.
    #[error("fetch failed: {0}")]
    Failed(#[from] DataError),
}

/// Pipeline stage that ran out of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Alignment,
    MovingAverage,
    Smoothing,
    Advice,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Alignment => "alignment",
            Stage::MovingAverage => "moving average",
            Stage::Smoothing => "smoothing",
            Stage::Advice => "advice",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("missing {series} data: {reason}")]
    MissingSource {
        series: SeriesKind,
        reason: MissingReason,
    },

    #[error("insufficient data for {stage}: need at least {required} rows, have {actual}")]
    InsufficientData {
        stage: Stage,
        required: usize,
        actual: usize,
    },

    #[error("no common trading dates across stock, industry and market series")]
    Alignment,

    #[error("{series} series starts at zero; relative strength is undefined")]
    InvalidBaseline { series: SeriesKind },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to serialize analysis: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AnalysisError {
    pub fn empty(series: SeriesKind) -> Self {
        AnalysisError::MissingSource {
            series,
            reason: MissingReason::Empty,
        }
    }

    pub fn failed(series: SeriesKind, error: DataError) -> Self {
        AnalysisError::MissingSource {
            series,
            reason: MissingReason::Failed(error),
        }
    }

    pub fn insufficient(stage: Stage, required: usize, actual: usize) -> Self {
        AnalysisError::InsufficientData {
            stage,
            required,
            actual,
        }
    }
}
