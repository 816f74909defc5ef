//! Synthetic provider for demos and tests.
//!
//! Produces a deterministic random walk per code, weekdays only. The seed is
//! the BLAKE3 hash of the code, so the same code always yields the same
//! series and different codes yield different ones. Output is tagged
//! `DataSource::Synthetic` and is clearly fake.

use super::provider::{DataError, DataSource, MarketDataProvider};
use crate::domain::{DailyBar, IndexPoint};
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Copy)]
pub struct SyntheticProvider {
    /// Maximum absolute daily return of the walk.
    daily_range: f64,
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self { daily_range: 0.03 }
    }
}

impl SyntheticProvider {
    pub fn new(daily_range: f64) -> Self {
        Self { daily_range }
    }

    /// Random walk starting at `start_price` over weekdays in `[start, end]`.
    fn walk(&self, code: &str, start: NaiveDate, end: NaiveDate, start_price: f64) -> Vec<DailyBar> {
        let seed: [u8; 32] = *blake3::hash(code.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let mut bars = Vec::new();
        let mut price = start_price;
        let mut current = start;

        while current <= end {
            if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
                current += chrono::Duration::days(1);
                continue;
            }

            let daily_return: f64 = if self.daily_range > 0.0 {
                rng.gen_range(-self.daily_range..self.daily_range)
            } else {
                0.0
            };
            price *= 1.0 + daily_return;
            let volume = rng.gen_range(500_000.0..5_000_000.0_f64).round();

            bars.push(DailyBar::new(current, price, volume));
            current += chrono::Duration::days(1);
        }

        bars
    }
}

impl MarketDataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn fetch_stock_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, DataError> {
        Ok(self.walk(symbol, start, end, 10.0))
    }

    fn fetch_industry_index(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<IndexPoint>, DataError> {
        Ok(self
            .walk(code, start, end, 1_000.0)
            .into_iter()
            .map(|b| IndexPoint::new(b.date, b.close))
            .collect())
    }

    fn fetch_market_index(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<IndexPoint>, DataError> {
        Ok(self
            .walk(code, start, end, 3_000.0)
            .into_iter()
            .map(|b| IndexPoint::new(b.date, b.close))
            .collect())
    }

    fn resolve_display_name(&self, symbol: &str) -> String {
        format!("Synthetic({symbol})")
    }
}
