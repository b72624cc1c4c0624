//! Telegram Bot API client.

use crate::notifier::{Notifier, NotifyError};
use async_trait::async_trait;
use pricebot_core::ChatId;
use reqwest::Client;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;
use tracing::{debug, warn};

/// Telegram Bot API base URL.
pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    description: Option<String>,
}

/// `getMe` result.
#[derive(Debug, Deserialize)]
struct BotUser {
    #[serde(default)]
    username: Option<String>,
}

/// Minimal Bot API client: send messages and register the webhook.
pub struct TelegramClient {
    http: Client,
    api_url: String,
    bot_token: String,
}

impl TelegramClient {
    pub fn new(http: Client, bot_token: &str) -> Self {
        Self::with_api_url(http, bot_token, TELEGRAM_API_URL)
    }

    pub fn with_api_url(http: Client, bot_token: &str, api_url: &str) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            bot_token: bot_token.to_string(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.bot_token, method)
    }

    /// Call a Bot API method with form parameters. Success is the `ok` flag.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, &str)],
    ) -> Result<T, NotifyError> {
        let response = self
            .http
            .post(self.method_url(method))
            .form(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let parsed: ApiResponse<T> = serde_json::from_str(&body).map_err(|e| {
            NotifyError::InvalidResponse(format!("HTTP {}: {}", status.as_u16(), e))
        })?;

        if parsed.ok {
            debug!(method, "Telegram API call succeeded");
            return parsed.result.ok_or_else(|| {
                NotifyError::InvalidResponse(format!("{method}: response has no result"))
            });
        }

        let error = NotifyError::Rejected {
            code: parsed.error_code.unwrap_or(i64::from(status.as_u16())),
            description: parsed.description.unwrap_or_default(),
        };
        warn!(method, error = %error, "Telegram API call rejected");
        Err(error)
    }

    /// Send an HTML-formatted message.
    pub async fn send_message(&self, chat: ChatId, text: &str) -> Result<(), NotifyError> {
        let chat_id = chat.to_string();
        self.call::<IgnoredAny>(
            "sendMessage",
            &[
                ("chat_id", chat_id.as_str()),
                ("text", text),
                ("parse_mode", "HTML"),
                ("disable_web_page_preview", "true"),
            ],
        )
        .await?;
        Ok(())
    }

    /// The bot's own username, used to recognise `/command@username`.
    pub async fn get_me(&self) -> Result<String, NotifyError> {
        let me: BotUser = self.call("getMe", &[]).await?;
        me.username
            .ok_or_else(|| NotifyError::InvalidResponse("getMe: bot has no username".into()))
    }

    /// Point Telegram at our webhook endpoint.
    pub async fn set_webhook(&self, url: &str, secret: Option<&str>) -> Result<(), NotifyError> {
        let mut params = vec![("url", url), ("allowed_updates", r#"["message"]"#)];
        if let Some(secret) = secret {
            params.push(("secret_token", secret));
        }
        self.call::<IgnoredAny>("setWebhook", &params).await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramClient {
    async fn notify(&self, chat: ChatId, text: &str) -> Result<(), NotifyError> {
        self.send_message(chat, text).await
    }
}
