//! Domain types for the RS decision engine

pub mod advice;
pub mod instrument;
pub mod series;

pub use advice::Advice;
pub use instrument::Instrument;
pub use series::{DailyBar, IndexPoint, SeriesKind, SourceSeries};

/// Instrument or index code as used by upstream providers (e.g. "002530").
pub type Code = String;
