//! Advice — the categorical recommendation produced for the final row.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Three-way recommendation, ordered from most to least constructive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Advice {
    /// Relative strength is rising and price sits above its short average.
    StrongBullish,
    /// Exactly one of the two conditions holds.
    CautiousBullish,
    /// Neither holds: stay out.
    Cautious,
}

impl Advice {
    /// Display color (hex RGB) for the advice banner.
    pub fn color(&self) -> &'static str {
        match self {
            Advice::StrongBullish => "#cf1322",
            Advice::CautiousBullish => "#f39c12",
            Advice::Cautious => "#27ae60",
        }
    }

    /// One-line headline shown next to the color.
    pub fn headline(&self) -> &'static str {
        match self {
            Advice::StrongBullish => "Strong bullish: resonance reversal",
            Advice::CautiousBullish => "Cautious bullish: pattern repair",
            Advice::Cautious => "Risk-off: trend weakening",
        }
    }
}

impl fmt::Display for Advice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.headline())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_are_distinct() {
        let colors = [
            Advice::StrongBullish.color(),
            Advice::CautiousBullish.color(),
            Advice::Cautious.color(),
        ];
        assert_eq!(colors[0], "#cf1322");
        assert_ne!(colors[0], colors[1]);
        assert_ne!(colors[1], colors[2]);
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&Advice::CautiousBullish).unwrap();
        assert_eq!(json, "\"cautious_bullish\"");
    }
}
