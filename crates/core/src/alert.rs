//! Per-chat alert thresholds.

use crate::Price;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chat or group identifier on the messaging platform.
/// Group chats have negative ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Threshold {
    /// Fires when the price drops to or below the level.
    Low,
    /// Fires when the price rises to or above the level.
    High,
}

impl Threshold {
    pub fn as_str(&self) -> &'static str {
        match self {
            Threshold::Low => "low",
            Threshold::High => "high",
        }
    }

    /// Whether `price` crosses a threshold set at `level`.
    #[inline]
    pub fn is_crossed(&self, level: Price, price: Price) -> bool {
        match self {
            Threshold::Low => price <= level,
            Threshold::High => price >= level,
        }
    }
}

/// Low/high thresholds of one chat. `None` means disarmed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Alert {
    pub low: Option<Price>,
    pub high: Option<Price>,
}

/// A threshold that the current price has crossed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    pub threshold: Threshold,
    pub level: Price,
}

impl Alert {
    pub fn get(&self, threshold: Threshold) -> Option<Price> {
        match threshold {
            Threshold::Low => self.low,
            Threshold::High => self.high,
        }
    }

    pub fn set(&mut self, threshold: Threshold, level: Option<Price>) {
        match threshold {
            Threshold::Low => self.low = level,
            Threshold::High => self.high = level,
        }
    }

    /// True if at least one side is set.
    pub fn is_armed(&self) -> bool {
        self.low.is_some() || self.high.is_some()
    }

    /// Thresholds crossed by `price`, low side first. Each side is checked independently.
    pub fn crossings(&self, price: Price) -> Vec<Crossing> {
        [Threshold::Low, Threshold::High]
            .into_iter()
            .filter_map(|threshold| {
                let level = self.get(threshold)?;
                threshold
                    .is_crossed(level, price)
                    .then_some(Crossing { threshold, level })
            })
            .collect()
    }
}
