//! Price values and their display formatting.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Why a user-supplied price was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceParseError {
    #[error("no price given")]
    Empty,

    #[error("'{0}' is not a valid number")]
    NotANumber(String),

    #[error("price must be greater than zero")]
    NotPositive,
}

/// USD price of a token.
///
/// Always finite and strictly positive, so a `Price` can be stored as a
/// threshold without further checks.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Price(f64);

impl Price {
    /// Create from a raw value. Returns `None` for zero, negative, NaN or infinite values.
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && value > 0.0).then_some(Self(value))
    }

    /// Raw value (for display/arithmetic).
    #[inline]
    pub fn to_f64(self) -> f64 {
        self.0
    }

    /// Convert into another currency with a "units per USD" rate.
    pub fn convert(self, rate: f64) -> Option<Self> {
        Self::new(self.0 * rate)
    }
}

impl TryFrom<f64> for Price {
    type Error = PriceParseError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() {
            return Err(PriceParseError::NotANumber(value.to_string()));
        }
        Self::new(value).ok_or(PriceParseError::NotPositive)
    }
}

impl From<Price> for f64 {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl FromStr for Price {
    type Err = PriceParseError;

    /// Parse user input such as `0.035`, `$0.035` or ` 12 `.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();
        if trimmed.is_empty() {
            return Err(PriceParseError::Empty);
        }

        let value: f64 = trimmed
            .parse()
            .map_err(|_| PriceParseError::NotANumber(trimmed.to_string()))?;

        // f64::from_str accepts "inf" and "NaN"
        if !value.is_finite() {
            return Err(PriceParseError::NotANumber(trimmed.to_string()));
        }

        Self::new(value).ok_or(PriceParseError::NotPositive)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", format_amount(self.0))
    }
}

/// Most decimals shown for tiny amounts.
const MAX_DECIMALS: usize = 18;

/// Format an amount with precision chosen by magnitude.
///
/// Trailing zeros are trimmed down to two decimals, so `0.035` stays
/// `0.035` and `50000.5` becomes `50000.50`.
pub fn format_amount(value: f64) -> String {
    let abs = value.abs();
    let decimals = if abs >= 1000.0 {
        2
    } else if abs >= 1.0 {
        4
    } else if abs >= 0.01 {
        6
    } else if abs >= 0.0001 || abs == 0.0 {
        8
    } else {
        // Very small prices (memecoins): keep three significant digits
        ((-abs.log10()).ceil() as usize + 3).min(MAX_DECIMALS)
    };

    let mut text = format!("{:.*}", decimals, value);
    if let Some(dot) = text.find('.') {
        let min_len = dot + 3;
        while text.len() > min_len && text.ends_with('0') {
            text.pop();
        }
    }
    text
}

/// Format an amount in a currency: `$1.50` for USD, `1.50 EUR` otherwise.
pub fn format_in_currency(value: f64, currency: &str) -> String {
    if currency.eq_ignore_ascii_case("USD") {
        format!("${}", format_amount(value))
    } else {
        format!("{} {}", format_amount(value), currency.to_uppercase())
    }
}
