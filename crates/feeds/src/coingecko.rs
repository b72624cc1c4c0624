//! CoinGecko simple-price provider.

use crate::error::FeedError;
use crate::http::get_json;
use crate::provider::PriceProvider;
use async_trait::async_trait;
use pricebot_core::{Price, Token};
use reqwest::Client;
use std::collections::HashMap;

/// CoinGecko API base URL.
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// `{"<id>": {"usd": 0.035}}`
type SimplePriceResponse = HashMap<String, HashMap<String, Option<f64>>>;

pub struct CoinGeckoProvider {
    http: Client,
    base_url: String,
}

impl CoinGeckoProvider {
    pub fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PriceProvider for CoinGeckoProvider {
    fn name(&self) -> &str {
        "coingecko"
    }

    async fn fetch_price(&self, token: &Token) -> Result<Price, FeedError> {
        let id = token
            .coingecko_id
            .as_deref()
            .ok_or_else(|| FeedError::NoData("token has no CoinGecko id".into()))?;

        let request = self
            .http
            .get(format!("{}/simple/price", self.base_url))
            .query(&[("ids", id), ("vs_currencies", "usd")]);

        let response: SimplePriceResponse = get_json(request).await?;

        response
            .get(id)
            .and_then(|quotes| quotes.get("usd").copied().flatten())
            .and_then(Price::new)
            .ok_or_else(|| FeedError::NoData(format!("no USD price for '{id}'")))
    }
}
