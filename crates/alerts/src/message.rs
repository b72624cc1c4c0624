//! Message formatting (Telegram HTML parse mode).

use pricebot_core::{format_in_currency, Alert, Crossing, Price, Threshold};
use pricebot_feeds::ExchangeRateService;
use std::sync::Arc;
use teloxide::utils::html;

/// Renders USD prices, adding the display currency when one is configured.
#[derive(Clone, Default)]
pub struct PriceDisplay {
    rates: Option<Arc<ExchangeRateService>>,
}

impl PriceDisplay {
    /// USD only.
    pub fn usd() -> Self {
        Self::default()
    }

    pub fn with_rates(rates: Arc<ExchangeRateService>) -> Self {
        if rates.is_usd() {
            return Self::usd();
        }
        Self { rates: Some(rates) }
    }

    /// `$0.035`, or `$0.035 (0.032 EUR)` when a fresh rate is available.
    pub async fn describe(&self, price: Price) -> String {
        let Some(rates) = &self.rates else {
            return price.to_string();
        };

        match rates.convert(price).await {
            Some(local) => format!(
                "{} ({})",
                price,
                format_in_currency(local.to_f64(), rates.currency())
            ),
            None => price.to_string(),
        }
    }
}

/// Notification sent when a threshold is crossed.
pub fn format_alert_message(symbol: &str, crossing: &Crossing, price_text: &str) -> String {
    let (icon, verb, command) = match crossing.threshold {
        Threshold::Low => ("🔻", "dropped to", "/setlow"),
        Threshold::High => ("🚀", "rose to", "/sethigh"),
    };

    let now = chrono::Utc::now();
    format!(
        "{icon} <b>{}</b> {verb} {price_text}\n\n\
         {} alert at {} has been cleared. Use {command} to re-arm.\n\n\
         ⏰ {}",
        html::escape(symbol),
        capitalize(crossing.threshold.as_str()),
        crossing.level,
        now.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

/// Reply to `/status`.
pub fn format_status(symbol: &str, alert: &Alert) -> String {
    let level = |price: Option<Price>| match price {
        Some(price) => price.to_string(),
        None => "not set".to_string(),
    };

    format!(
        "📊 <b>{} alerts</b>\n\n\
         Low: {}\n\
         High: {}",
        html::escape(symbol),
        level(alert.low),
        level(alert.high)
    )
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
