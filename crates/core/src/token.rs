//! Definition of the tracked token.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Token whose price is monitored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    /// Ticker symbol (e.g., "PEPE")
    pub symbol: CompactString,
    /// Human-readable name, used as an alternate search term
    pub name: CompactString,
    /// Contract address for DEX lookups
    pub address: Option<String>,
    /// CoinGecko API id (e.g., "pepe")
    pub coingecko_id: Option<String>,
}

impl Token {
    /// Create a token known only by its symbol. The name defaults to the symbol.
    pub fn new(symbol: &str) -> Self {
        let symbol = CompactString::new(symbol.trim().to_uppercase());
        Self {
            name: symbol.clone(),
            symbol,
            address: None,
            coingecko_id: None,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = CompactString::new(name.trim());
        self
    }

    pub fn with_address(mut self, address: &str) -> Self {
        self.address = Some(address.trim().to_string());
        self
    }

    pub fn with_coingecko_id(mut self, id: &str) -> Self {
        self.coingecko_id = Some(id.trim().to_lowercase());
        self
    }

    /// Whether a market's base token refers to this token (case-insensitive on symbol or name).
    pub fn matches(&self, symbol: &str, name: &str) -> bool {
        self.symbol.eq_ignore_ascii_case(symbol.trim()) || self.name.eq_ignore_ascii_case(name.trim())
    }

    /// True if the name adds nothing over the symbol as a search term.
    pub fn name_is_symbol(&self) -> bool {
        self.name.eq_ignore_ascii_case(&self.symbol)
    }
}
