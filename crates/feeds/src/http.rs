//! Shared HTTP plumbing for REST providers.

use crate::error::FeedError;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// User agent sent with every provider request.
pub const USER_AGENT: &str = concat!("pricebot/", env!("CARGO_PKG_VERSION"));

/// Default request timeout. The only bound on how long a fetch can take.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build a client with the given request timeout.
pub fn build_client(timeout: Duration) -> Result<Client, FeedError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| FeedError::ConnectionFailed(e.to_string()))
}

/// Send a request and decode a JSON body.
/// 429 maps to `RateLimitExceeded`, any other non-2xx to `HttpStatus`.
pub async fn get_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, FeedError> {
    let response = request.send().await?;

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(FeedError::RateLimitExceeded);
    }
    if !status.is_success() {
        return Err(FeedError::HttpStatus(status.as_u16()));
    }

    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}
