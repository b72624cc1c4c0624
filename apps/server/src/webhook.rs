//! Telegram webhook endpoint.
//!
//! Telegram redelivers any update that is not answered with 2xx, so every
//! parseable update is acknowledged, including ones we ignore.

use crate::state::SharedState;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Router,
};
use pricebot_core::ChatId;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

/// Header Telegram uses to echo the webhook secret.
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// The parts of a Telegram `Update` the bot reads. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Create the HTTP router.
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/webhook", post(webhook_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler.
async fn health_handler() -> &'static str {
    "OK"
}

async fn webhook_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let provided = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
    if !state.secret_matches(provided) {
        warn!("Webhook request with invalid secret token");
        return StatusCode::UNAUTHORIZED;
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!(error = %e, "Malformed webhook update");
            return StatusCode::BAD_REQUEST;
        }
    };

    process_update(&state, update).await;
    StatusCode::OK
}

async fn process_update(state: &SharedState, update: Update) {
    let Some(message) = update.message else {
        debug!(update_id = update.update_id, "Ignoring non-message update");
        return;
    };
    let Some(text) = message.text else {
        return;
    };

    let chat = ChatId(message.chat.id);
    if !state.is_allowed(chat) {
        debug!(chat_id = %chat, "Ignoring update from unauthorized chat");
        return;
    }

    let Some(reply) = state.commands.handle(chat, &text).await else {
        return;
    };

    if let Err(e) = state.notifier.notify(chat, &reply).await {
        error!(chat_id = %chat, error = %e, "Failed to send reply");
    }
}
