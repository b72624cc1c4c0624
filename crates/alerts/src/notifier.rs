//! Outbound notification seam.

use async_trait::async_trait;
use pricebot_core::ChatId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Request failed: {0}")]
    Http(String),
    #[error("Telegram API error {code}: {description}")]
    Rejected { code: i64, description: String },
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL contains the bot token
        NotifyError::Http(err.without_url().to_string())
    }
}

/// Delivers a text message to a chat.
/// `Ok` means the platform acknowledged delivery.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, chat: ChatId, text: &str) -> Result<(), NotifyError>;
}
