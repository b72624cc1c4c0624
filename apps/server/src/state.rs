//! Application state shared with the webhook handlers.

use pricebot_alerts::{CommandHandler, Notifier};
use pricebot_core::ChatId;
use std::sync::Arc;

/// Shared state reference.
pub type SharedState = Arc<AppState>;

pub struct AppState {
    /// Command handling over the shared alert store.
    pub commands: CommandHandler,
    /// Sends replies back to the chat.
    pub notifier: Arc<dyn Notifier>,
    /// When set, updates from other chats are ignored.
    pub allowed_chat: Option<ChatId>,
    /// Expected value of the webhook secret header.
    pub webhook_secret: Option<String>,
}

impl AppState {
    /// Whether commands from `chat` are accepted.
    pub fn is_allowed(&self, chat: ChatId) -> bool {
        self.allowed_chat.map_or(true, |allowed| allowed == chat)
    }

    /// Whether the secret header value authorizes the request.
    pub fn secret_matches(&self, provided: Option<&str>) -> bool {
        match &self.webhook_secret {
            Some(expected) => provided == Some(expected.as_str()),
            None => true,
        }
    }
}

/// Create the shared state.
pub fn create_state(
    commands: CommandHandler,
    notifier: Arc<dyn Notifier>,
    allowed_chat: Option<ChatId>,
    webhook_secret: Option<String>,
) -> SharedState {
    Arc::new(AppState {
        commands,
        notifier,
        allowed_chat,
        webhook_secret,
    })
}
