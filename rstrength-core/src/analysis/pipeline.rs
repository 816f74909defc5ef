//! Pure sequencing of the analysis stages over in-memory inputs.
//!
//! align → relative strength → smoothing → {extrema, signals} → advice.
//! Every stage returns fresh vectors; nothing upstream is mutated.

use super::advice::{advise, AdviceReading};
use super::align::align_series;
use super::extrema::{find_extrema, ExtremaSet};
use super::savgol::smooth_series;
use super::signals::{breakout_mask, volume_anomaly_mask, SignalMask};
use super::strength::relative_strength;
use super::table::{AnalysisTable, SmoothedSeries};
use crate::config::AnalysisConfig;
use crate::domain::{Instrument, SourceSeries};
use crate::error::{AnalysisError, Stage};
use crate::fingerprint::{analysis_fingerprint, Fingerprint};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Turning points of the three smoothed trend series.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtremaReport {
    pub rs_industry: ExtremaSet,
    pub rs_market: ExtremaSet,
    pub moving_average: ExtremaSet,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalReport {
    pub breakout: SignalMask,
    pub volume_anomaly: SignalMask,
}

/// Complete result of one run, ready for rendering or JSON export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub instrument: Instrument,
    /// Date of the last aligned row.
    pub as_of: NaiveDate,
    pub table: AnalysisTable,
    pub extrema: ExtremaReport,
    pub signals: SignalReport,
    pub advice: AdviceReading,
    pub fingerprint: Fingerprint,
}

/// Run every stage over three raw series.
pub fn analyze(
    instrument: Instrument,
    inputs: &SourceSeries,
    config: &AnalysisConfig,
) -> Result<Analysis, AnalysisError> {
    config
        .validate()
        .map_err(|e| AnalysisError::Config(e.to_string()))?;

    let aligned = align_series(inputs, config.alignment.min_aligned_rows)?;
    let strength = relative_strength(&aligned, config.signals.ma_period)?;

    let closes = aligned.closes();
    let smoothed = SmoothedSeries {
        rs_industry: smooth_series(&strength.rs_industry, &config.smoothing)?,
        rs_market: smooth_series(&strength.rs_market, &config.smoothing)?,
        moving_average: smooth_series(&strength.moving_average_filled, &config.smoothing)?,
        close: smooth_series(&closes, &config.smoothing)?,
    };
    debug!(rows = aligned.len(), "smoothed four series");

    let extrema = ExtremaReport {
        rs_industry: find_extrema(&smoothed.rs_industry),
        rs_market: find_extrema(&smoothed.rs_market),
        moving_average: find_extrema(&smoothed.moving_average),
    };

    let signals = SignalReport {
        breakout: breakout_mask(&closes, &strength.moving_average_filled),
        volume_anomaly: volume_anomaly_mask(
            &closes,
            &aligned.volumes(),
            config.signals.volume_period,
            config.signals.volume_multiplier,
        ),
    };
    debug!(
        breakouts = signals.breakout.count(),
        volume_anomalies = signals.volume_anomaly.count(),
        "signals detected"
    );

    let advice = advise(&smoothed.rs_industry, &closes, &strength.moving_average)?;

    let table = AnalysisTable::assemble(&aligned, strength, smoothed);
    let as_of = table
        .last_date()
        .ok_or_else(|| AnalysisError::insufficient(Stage::Alignment, 1, 0))?;
    let fingerprint = analysis_fingerprint(&table, &extrema, &signals, &advice)?;

    info!(
        symbol = %instrument.symbol,
        rows = table.len(),
        %as_of,
        advice = ?advice.advice,
        fingerprint = fingerprint.short(),
        "analysis complete"
    );

    Ok(Analysis {
        instrument,
        as_of,
        table,
        extrema,
        signals,
        advice,
        fingerprint,
    })
}
