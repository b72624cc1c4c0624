//! Telegram price alerts.
//!
//! This crate provides:
//! - In-memory per-chat alert thresholds
//! - Chat command parsing and handling
//! - The fixed-interval alert evaluator
//! - Telegram Bot API notifications

pub mod command;
pub mod evaluator;
pub mod handler;
pub mod message;
pub mod notifier;
pub mod store;
pub mod telegram;

pub use command::{parse_incoming, Command, Incoming};
pub use evaluator::{AlertEvaluator, TickReport};
pub use handler::CommandHandler;
pub use message::PriceDisplay;
pub use notifier::{Notifier, NotifyError};
pub use store::AlertStore;
pub use telegram::TelegramClient;
