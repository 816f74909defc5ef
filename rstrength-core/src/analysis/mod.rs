//! The analysis pipeline, leaf stages first.

pub mod advice;
pub mod align;
pub mod extrema;
pub mod pipeline;
pub mod rolling;
pub mod savgol;
pub mod signals;
pub mod strength;
pub mod table;

pub use advice::{advise, classify, AdviceReading};
pub use align::{align_series, AlignedRow, AlignedTable};
pub use extrema::{find_extrema, ExtremaSet};
pub use pipeline::{analyze, Analysis, ExtremaReport, SignalReport};
pub use rolling::{fill_forward_backward, rolling_mean};
pub use savgol::{smooth_series, SavitzkyGolay};
pub use signals::{breakout_mask, volume_anomaly_mask, SignalMask};
pub use strength::{relative_strength, RelativeStrength};
pub use table::{AnalysisRow, AnalysisTable, SmoothedSeries};
