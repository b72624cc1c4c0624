//! Chat command handling.

use crate::command::{parse_incoming, Command, Incoming};
use crate::message::{format_status, PriceDisplay};
use crate::store::AlertStore;
use pricebot_core::{ChatId, Price, Threshold};
use pricebot_feeds::PriceSource;
use std::sync::Arc;
use teloxide::utils::html;
use tracing::{debug, info};

/// Turns chat messages into store updates and reply text.
pub struct CommandHandler {
    store: Arc<AlertStore>,
    prices: Arc<dyn PriceSource>,
    display: PriceDisplay,
    bot_username: Option<String>,
}

impl CommandHandler {
    pub fn new(store: Arc<AlertStore>, prices: Arc<dyn PriceSource>, display: PriceDisplay) -> Self {
        Self {
            store,
            prices,
            display,
            bot_username: None,
        }
    }

    /// Only accept `/command@name` mentions addressed to this bot.
    pub fn with_bot_username(mut self, username: &str) -> Self {
        self.bot_username = Some(username.trim_start_matches('@').to_string());
        self
    }

    /// Handle one message. Returns the reply, or `None` for plain text.
    pub async fn handle(&self, chat: ChatId, text: &str) -> Option<String> {
        let command = match parse_incoming(text, self.bot_username.as_deref()) {
            Incoming::NotCommand => return None,
            Incoming::Unknown(word) => {
                debug!(chat_id = %chat, command = %word, "Unknown command");
                return Some(format!(
                    "Unknown command {}. Send /help for the list of commands.",
                    html::escape(&word)
                ));
            }
            Incoming::BadArguments(word) => {
                self.store.get_or_create(chat);
                return Some(format!("Could not read that command. {}", usage(&word)));
            }
            Incoming::Command(command) => command,
        };

        self.store.get_or_create(chat);

        let reply = match command {
            Command::Start => self.welcome(),
            Command::SetLow(arg) => self.set_threshold(chat, Threshold::Low, &arg),
            Command::SetHigh(arg) => self.set_threshold(chat, Threshold::High, &arg),
            Command::Price => self.price().await,
            Command::Status => {
                let alert = self.store.get_or_create(chat);
                format_status(self.symbol(), &alert)
            }
            Command::Clear => {
                self.store.clear(chat);
                info!(chat_id = %chat, "Alerts cleared");
                "🧹 Both alerts cleared.".to_string()
            }
            Command::Help => html::escape(&Command::help_text()),
        };
        Some(reply)
    }

    fn symbol(&self) -> &str {
        &self.prices.token().symbol
    }

    fn welcome(&self) -> String {
        let token = self.prices.token();
        let tracked = if token.name_is_symbol() {
            format!("<b>{}</b>", html::escape(&token.symbol))
        } else {
            format!(
                "<b>{}</b> ({})",
                html::escape(&token.symbol),
                html::escape(&token.name)
            )
        };

        format!(
            "👋 Welcome! I track {tracked} and message you when it crosses your levels.\n\n\
             /setlow 0.035 alerts when the price drops to or below 0.035\n\
             /sethigh 0.05 alerts when the price rises to or above 0.05\n\
             /help lists every command"
        )
    }

    fn set_threshold(&self, chat: ChatId, threshold: Threshold, arg: &str) -> String {
        let command = match threshold {
            Threshold::Low => "/setlow",
            Threshold::High => "/sethigh",
        };

        let level: Price = match arg.parse() {
            Ok(level) => level,
            Err(e) => {
                debug!(chat_id = %chat, input = arg, "Rejected threshold");
                return format!(
                    "❌ Invalid price: {}. {}",
                    html::escape(&e.to_string()),
                    usage(command)
                );
            }
        };

        match threshold {
            Threshold::Low => self.store.set_low(chat, level),
            Threshold::High => self.store.set_high(chat, level),
        };
        info!(
            chat_id = %chat,
            threshold = threshold.as_str(),
            level = level.to_f64(),
            "Alert set"
        );

        let direction = match threshold {
            Threshold::Low => "drops to or below",
            Threshold::High => "rises to or above",
        };
        format!(
            "✅ I'll alert you when {} {direction} {level}.",
            html::escape(self.symbol())
        )
    }

    async fn price(&self) -> String {
        match self.prices.get_price().await {
            Some(price) => format!(
                "💰 <b>{}</b>: {}",
                html::escape(self.symbol()),
                self.display.describe(price).await
            ),
            None => "⚠️ Price unavailable right now, try again shortly.".to_string(),
        }
    }
}

fn usage(command: &str) -> String {
    match command {
        "/setlow" => "Usage: /setlow 0.035".to_string(),
        "/sethigh" => "Usage: /sethigh 0.05".to_string(),
        _ => "Send /help for the list of commands.".to_string(),
    }
}
