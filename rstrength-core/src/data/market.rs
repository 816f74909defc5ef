//! Broad-market benchmark selection for A-share symbols.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The market index a stock is measured against, chosen by its exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketIndex {
    /// Shanghai Composite.
    ShanghaiComposite,
    /// Shenzhen Component.
    ShenzhenComponent,
    /// Beijing Stock Exchange 50.
    Beijing50,
}

impl MarketIndex {
    /// Pick the benchmark from the symbol prefix.
    ///
    /// `60`/`68` trade in Shanghai, `00`/`30` in Shenzhen, `8`/`4` in Beijing.
    /// Anything unrecognised falls back to the Shanghai Composite.
    pub fn for_symbol(symbol: &str) -> Self {
        let s = symbol.trim();
        if s.starts_with("60") || s.starts_with("68") {
            MarketIndex::ShanghaiComposite
        } else if s.starts_with("00") || s.starts_with("30") {
            MarketIndex::ShenzhenComponent
        } else if s.starts_with('8') || s.starts_with('4') {
            MarketIndex::Beijing50
        } else {
            MarketIndex::ShanghaiComposite
        }
    }

    /// Exchange-prefixed code, e.g. "sh000001".
    pub fn code(&self) -> &'static str {
        match self {
            MarketIndex::ShanghaiComposite => "sh000001",
            MarketIndex::ShenzhenComponent => "sz399001",
            MarketIndex::Beijing50 => "sz899050",
        }
    }
}

impl fmt::Display for MarketIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
