//! Content fingerprint of an analysis result.
//!
//! BLAKE3 over the compact JSON of the derived data. Field order comes from
//! the struct definitions and every collection is a `Vec`, so equal results
//! always serialize to the same bytes.

use crate::analysis::{AdviceReading, AnalysisTable, ExtremaReport, SignalReport};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hex-encoded BLAKE3 digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(pub String);

impl Fingerprint {
    /// Hash the canonical JSON form of `value`.
    pub fn of<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        let mut hasher = blake3::Hasher::new();
        serde_json::to_writer(&mut hasher, value)?;
        Ok(Self(hasher.finalize().to_hex().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for log lines and terminal output.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Serialize)]
struct Canonical<'a> {
    table: &'a AnalysisTable,
    extrema: &'a ExtremaReport,
    signals: &'a SignalReport,
    advice: &'a AdviceReading,
}

/// Fingerprint of the parts of an analysis that depend on the input data.
pub fn analysis_fingerprint(
    table: &AnalysisTable,
    extrema: &ExtremaReport,
    signals: &SignalReport,
    advice: &AdviceReading,
) -> Result<Fingerprint, serde_json::Error> {
    Fingerprint::of(&Canonical {
        table,
        extrema,
        signals,
        advice,
    })
}
