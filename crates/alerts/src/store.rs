//! In-memory alert store keyed by chat.

use dashmap::DashMap;
use pricebot_core::{Alert, ChatId, Price, Threshold};

/// Per-chat thresholds for the lifetime of the process.
///
/// Entries are created on first use and never removed. No guard is held
/// across an `.await`; every method copies the `Alert` out.
#[derive(Debug, Default)]
pub struct AlertStore {
    alerts: DashMap<ChatId, Alert>,
}

impl AlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the chat's alert, registering the chat if it is new.
    pub fn get_or_create(&self, chat: ChatId) -> Alert {
        *self.alerts.entry(chat).or_default()
    }

    pub fn get(&self, chat: ChatId) -> Option<Alert> {
        self.alerts.get(&chat).map(|alert| *alert)
    }

    pub fn set_low(&self, chat: ChatId, level: Price) -> Alert {
        self.set(chat, Threshold::Low, level)
    }

    pub fn set_high(&self, chat: ChatId, level: Price) -> Alert {
        self.set(chat, Threshold::High, level)
    }

    /// Arm one side of the chat's alert, returning the updated alert.
    fn set(&self, chat: ChatId, threshold: Threshold, level: Price) -> Alert {
        let mut entry = self.alerts.entry(chat).or_default();
        entry.set(threshold, Some(level));
        *entry
    }

    /// Disarm both sides. The chat stays registered.
    pub fn clear(&self, chat: ChatId) -> Alert {
        let mut entry = self.alerts.entry(chat).or_default();
        *entry = Alert::default();
        *entry
    }

    /// Disarm a side after it fired, but only if it still holds `fired`.
    /// A level the user set in the meantime is kept. Returns whether it was cleared.
    pub fn disarm(&self, chat: ChatId, threshold: Threshold, fired: Price) -> bool {
        match self.alerts.get_mut(&chat) {
            Some(mut alert) if alert.get(threshold) == Some(fired) => {
                alert.set(threshold, None);
                true
            }
            _ => false,
        }
    }

    /// Copy of every registered chat and its alert, ordered by chat id.
    pub fn snapshot(&self) -> Vec<(ChatId, Alert)> {
        let mut entries: Vec<(ChatId, Alert)> = self
            .alerts
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect();
        entries.sort_by_key(|(chat, _)| *chat);
        entries
    }

    /// Number of registered chats.
    pub fn chat_count(&self) -> usize {
        self.alerts.len()
    }
}
