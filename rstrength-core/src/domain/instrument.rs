use super::Code;
use serde::{Deserialize, Serialize};

/// The analysed stock: upstream code plus a human-readable name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: Code,
    pub display_name: String,
}

impl Instrument {
    pub fn new(symbol: impl Into<Code>, display_name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            display_name: display_name.into(),
        }
    }
}
