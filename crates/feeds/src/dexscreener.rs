//! DexScreener REST provider.
//!
//! Both endpoints return a list of trading pairs; the pair with the highest
//! USD liquidity among those quoting a positive price for our token wins.

use crate::error::FeedError;
use crate::http::get_json;
use crate::provider::PriceProvider;
use async_trait::async_trait;
use pricebot_core::{Price, Token};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

/// DexScreener API base URL.
pub const DEXSCREENER_API_URL: &str = "https://api.dexscreener.com";

/// How the token is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DexQuery {
    /// `/latest/dex/tokens/{address}`, pairs filtered by base token address.
    Address,
    /// `/latest/dex/search?q={symbol}`, pairs filtered by symbol or name.
    Symbol,
    /// `/latest/dex/search?q={name}`, pairs filtered by symbol or name.
    Name,
}

impl DexQuery {
    fn label(&self) -> &'static str {
        match self {
            DexQuery::Address => "dexscreener:address",
            DexQuery::Symbol => "dexscreener:symbol",
            DexQuery::Name => "dexscreener:name",
        }
    }
}

/// Response of both the token and the search endpoint.
#[derive(Debug, Deserialize)]
pub struct PairsResponse {
    #[serde(default)]
    pub pairs: Option<Vec<DexPair>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DexPair {
    #[serde(default)]
    pub chain_id: String,
    #[serde(default)]
    pub dex_id: String,
    #[serde(default)]
    pub pair_address: String,
    pub base_token: DexToken,
    /// Price of the base token in USD, as a decimal string
    #[serde(default)]
    pub price_usd: Option<String>,
    #[serde(default)]
    pub liquidity: Option<DexLiquidity>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DexToken {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DexLiquidity {
    #[serde(default)]
    pub usd: Option<f64>,
}

impl DexPair {
    /// Quoted USD price, if present and strictly positive.
    pub fn price(&self) -> Option<Price> {
        self.price_usd
            .as_deref()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .and_then(Price::new)
    }

    /// Reported USD liquidity; missing or invalid counts as zero.
    pub fn liquidity_usd(&self) -> f64 {
        self.liquidity
            .and_then(|l| l.usd)
            .filter(|usd| usd.is_finite())
            .unwrap_or(0.0)
    }

    fn refers_to(&self, token: &Token, query: DexQuery) -> bool {
        match query {
            DexQuery::Address => token
                .address
                .as_deref()
                .is_some_and(|address| self.base_token.address.eq_ignore_ascii_case(address)),
            DexQuery::Symbol | DexQuery::Name => {
                token.matches(&self.base_token.symbol, &self.base_token.name)
            }
        }
    }
}

/// Pick the highest-liquidity pair that quotes a positive price for `token`.
pub fn select_best_pair<'a>(
    pairs: &'a [DexPair],
    token: &Token,
    query: DexQuery,
) -> Option<(&'a DexPair, Price)> {
    pairs
        .iter()
        .filter(|pair| pair.refers_to(token, query))
        .filter_map(|pair| pair.price().map(|price| (pair, price)))
        .max_by(|(a, _), (b, _)| a.liquidity_usd().total_cmp(&b.liquidity_usd()))
}

/// DexScreener provider for one query kind.
pub struct DexScreenerProvider {
    http: Client,
    base_url: String,
    query: DexQuery,
}

impl DexScreenerProvider {
    pub fn with_base_url(http: Client, query: DexQuery, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            query,
        }
    }
}

#[async_trait]
impl PriceProvider for DexScreenerProvider {
    fn name(&self) -> &str {
        self.query.label()
    }

    async fn fetch_price(&self, token: &Token) -> Result<Price, FeedError> {
        let request = match self.query {
            DexQuery::Address => {
                let address = token
                    .address
                    .as_deref()
                    .ok_or_else(|| FeedError::NoData("token has no contract address".into()))?;
                self.http
                    .get(format!("{}/latest/dex/tokens/{}", self.base_url, address))
            }
            DexQuery::Symbol => self
                .http
                .get(format!("{}/latest/dex/search", self.base_url))
                .query(&[("q", token.symbol.as_str())]),
            DexQuery::Name => self
                .http
                .get(format!("{}/latest/dex/search", self.base_url))
                .query(&[("q", token.name.as_str())]),
        };

        let response: PairsResponse = get_json(request).await?;
        let pairs = response.pairs.unwrap_or_default();

        let (pair, price) = select_best_pair(&pairs, token, self.query).ok_or_else(|| {
            FeedError::NoData(format!(
                "no priced pair for {} among {} results",
                token.symbol,
                pairs.len()
            ))
        })?;

        debug!(
            provider = self.name(),
            chain = %pair.chain_id,
            dex = %pair.dex_id,
            pair = %pair.pair_address,
            liquidity_usd = pair.liquidity_usd(),
            "Selected pair"
        );

        Ok(price)
    }
}
