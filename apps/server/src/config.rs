//! Application configuration.

use clap::Parser;
use pricebot_alerts::evaluator::DEFAULT_CHECK_INTERVAL;
use pricebot_core::{ChatId, Token};
use pricebot_feeds::exchange_rate::DEFAULT_RATE_TTL;
use pricebot_feeds::http::DEFAULT_TIMEOUT;
use pricebot_feeds::service::DEFAULT_PRICE_TTL;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Telegram price alert bot
#[derive(Parser, Debug, Clone)]
#[command(name = "pricebot")]
#[command(about = "Telegram price alerts for a single token", long_about = None)]
pub struct Args {
    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub bot_token: Option<String>,

    /// Only accept commands from this chat
    #[arg(long, env = "ALLOWED_CHAT_ID", allow_hyphen_values = true)]
    pub allowed_chat_id: Option<i64>,

    /// Public URL to register with Telegram's setWebhook
    #[arg(long, env = "WEBHOOK_URL")]
    pub webhook_url: Option<String>,

    /// Expected X-Telegram-Bot-Api-Secret-Token header value
    #[arg(long, env = "WEBHOOK_SECRET", hide_env_values = true)]
    pub webhook_secret: Option<String>,

    /// Symbol of the tracked token
    #[arg(long, env = "TOKEN_SYMBOL")]
    pub token_symbol: Option<String>,

    /// Full name of the tracked token (defaults to the symbol)
    #[arg(long, env = "TOKEN_NAME")]
    pub token_name: Option<String>,

    /// Contract address of the tracked token
    #[arg(long, env = "TOKEN_ADDRESS")]
    pub token_address: Option<String>,

    /// CoinGecko coin id, enables the CoinGecko fallback
    #[arg(long, env = "COINGECKO_ID")]
    pub coingecko_id: Option<String>,

    /// Currency shown next to USD prices
    #[arg(long, env = "DISPLAY_CURRENCY", default_value = "USD")]
    pub display_currency: String,

    /// Seconds between alert checks
    #[arg(long, env = "CHECK_INTERVAL_SECS", default_value_t = DEFAULT_CHECK_INTERVAL.as_secs())]
    pub check_interval_secs: u64,

    /// Seconds a fetched price stays fresh
    #[arg(long, env = "PRICE_TTL_SECS", default_value_t = DEFAULT_PRICE_TTL.as_secs())]
    pub price_ttl_secs: u64,

    /// Seconds an exchange rate stays fresh
    #[arg(long, env = "RATE_TTL_SECS", default_value_t = DEFAULT_RATE_TTL.as_secs())]
    pub rate_ttl_secs: u64,

    /// Timeout for outbound HTTP requests
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub request_timeout_secs: u64,

    /// Address to bind the webhook server to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port of the webhook server
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required setting {flag} (env {env})")]
    Missing {
        flag: &'static str,
        env: &'static str,
    },
    #[error("{name} must be greater than zero")]
    ZeroInterval { name: &'static str },
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub telegram: TelegramSettings,
    pub token: TokenSettings,
    pub feeds: FeedSettings,
    pub monitor: MonitorSettings,
    pub server: ServerSettings,
    /// Logging level.
    pub log_level: String,
}

/// Telegram settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramSettings {
    pub bot_token: String,
    pub allowed_chat_id: Option<ChatId>,
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,
}

// Keep the token and secret out of logs.
impl std::fmt::Debug for TelegramSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSettings")
            .field("bot_token", &"<redacted>")
            .field("allowed_chat_id", &self.allowed_chat_id)
            .field("webhook_url", &self.webhook_url)
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// The tracked token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSettings {
    pub symbol: String,
    pub name: Option<String>,
    pub address: Option<String>,
    pub coingecko_id: Option<String>,
}

impl TokenSettings {
    pub fn to_token(&self) -> Token {
        let mut token = Token::new(&self.symbol);
        if let Some(name) = &self.name {
            token = token.with_name(name);
        }
        if let Some(address) = &self.address {
            token = token.with_address(address);
        }
        if let Some(id) = &self.coingecko_id {
            token = token.with_coingecko_id(id);
        }
        token
    }
}

/// Price and exchange-rate fetching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSettings {
    pub display_currency: String,
    pub price_ttl_secs: u64,
    pub rate_ttl_secs: u64,
    pub request_timeout_secs: u64,
}

impl FeedSettings {
    pub fn price_ttl(&self) -> Duration {
        Duration::from_secs(self.price_ttl_secs)
    }

    pub fn rate_ttl(&self) -> Duration {
        Duration::from_secs(self.rate_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Alert evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSettings {
    pub check_interval_secs: u64,
}

impl MonitorSettings {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }
}

/// Webhook server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl TryFrom<Args> for AppConfig {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let bot_token = non_empty(args.bot_token).ok_or(ConfigError::Missing {
            flag: "--bot-token",
            env: "TELEGRAM_BOT_TOKEN",
        })?;
        let symbol = non_empty(args.token_symbol).ok_or(ConfigError::Missing {
            flag: "--token-symbol",
            env: "TOKEN_SYMBOL",
        })?;

        for (name, value) in [
            ("check interval", args.check_interval_secs),
            ("price TTL", args.price_ttl_secs),
            ("request timeout", args.request_timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroInterval { name });
            }
        }

        Ok(Self {
            telegram: TelegramSettings {
                bot_token,
                allowed_chat_id: args.allowed_chat_id.map(ChatId),
                webhook_url: non_empty(args.webhook_url),
                webhook_secret: non_empty(args.webhook_secret),
            },
            token: TokenSettings {
                symbol,
                name: non_empty(args.token_name),
                address: non_empty(args.token_address),
                coingecko_id: non_empty(args.coingecko_id),
            },
            feeds: FeedSettings {
                display_currency: args.display_currency.trim().to_uppercase(),
                price_ttl_secs: args.price_ttl_secs,
                rate_ttl_secs: args.rate_ttl_secs,
                request_timeout_secs: args.request_timeout_secs,
            },
            monitor: MonitorSettings {
                check_interval_secs: args.check_interval_secs,
            },
            server: ServerSettings {
                host: args.host,
                port: args.port,
            },
            log_level: args.log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(argv: &[&str]) -> Result<AppConfig, ConfigError> {
        let mut full = vec!["pricebot"];
        full.extend_from_slice(argv);
        AppConfig::try_from(Args::try_parse_from(full).unwrap())
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse(&["--bot-token", "123:ABC", "--token-symbol", "pepe"]).unwrap();

        assert_eq!(config.telegram.bot_token, "123:ABC");
        assert_eq!(config.telegram.allowed_chat_id, None);
        assert_eq!(config.token.symbol, "pepe");
        assert_eq!(config.feeds.display_currency, "USD");
        assert_eq!(config.feeds.price_ttl(), DEFAULT_PRICE_TTL);
        assert_eq!(config.feeds.rate_ttl(), DEFAULT_RATE_TTL);
        assert_eq!(config.feeds.request_timeout(), DEFAULT_TIMEOUT);
        assert_eq!(config.monitor.check_interval(), DEFAULT_CHECK_INTERVAL);
        assert_eq!(config.monitor.check_interval(), Duration::from_secs(60));
        assert_eq!(config.server.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_missing_bot_token() {
        let err = parse(&["--token-symbol", "PEPE"]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Missing {
                flag: "--bot-token",
                env: "TELEGRAM_BOT_TOKEN"
            }
        );
    }

    #[test]
    fn test_blank_symbol_is_missing() {
        let err = parse(&["--bot-token", "1:A", "--token-symbol", "  "]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { env: "TOKEN_SYMBOL", .. }));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = parse(&[
            "--bot-token",
            "1:A",
            "--token-symbol",
            "PEPE",
            "--check-interval-secs",
            "0",
        ])
        .unwrap_err();
        assert_eq!(err, ConfigError::ZeroInterval { name: "check interval" });
    }

    #[test]
    fn test_negative_group_chat_id() {
        let config = parse(&[
            "--bot-token",
            "1:A",
            "--token-symbol",
            "PEPE",
            "--allowed-chat-id",
            "-1001234",
            "--display-currency",
            "eur",
        ])
        .unwrap();
        assert_eq!(config.telegram.allowed_chat_id, Some(ChatId(-1001234)));
        assert_eq!(config.feeds.display_currency, "EUR");
    }

    #[test]
    fn test_token_settings_to_token() {
        let settings = TokenSettings {
            symbol: "pepe".to_string(),
            name: Some("Pepe Coin".to_string()),
            address: Some("0xabc".to_string()),
            coingecko_id: Some("Pepe".to_string()),
        };
        let token = settings.to_token();

        assert_eq!(token.symbol, "PEPE");
        assert_eq!(token.name, "Pepe Coin");
        assert_eq!(token.address.as_deref(), Some("0xabc"));
        assert_eq!(token.coingecko_id.as_deref(), Some("pepe"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = parse(&[
            "--bot-token",
            "123:SECRET",
            "--token-symbol",
            "PEPE",
            "--webhook-secret",
            "hunter2",
        ])
        .unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("SECRET"));
        assert!(!debug.contains("hunter2"));
    }
}
