//! Cached price lookup for the tracked token.

use crate::cache::TtlCache;
use crate::coingecko::{CoinGeckoProvider, COINGECKO_API_URL};
use crate::dexscreener::{DexQuery, DexScreenerProvider, DEXSCREENER_API_URL};
use crate::provider::{FallbackChain, PriceProvider};
use async_trait::async_trait;
use pricebot_core::{Price, Token};
use reqwest::Client;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Default price cache TTL.
pub const DEFAULT_PRICE_TTL: Duration = Duration::from_secs(30);

/// Anything that can report the current token price.
/// `None` means no fresh data is available right now.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn get_price(&self) -> Option<Price>;

    /// The token being priced.
    fn token(&self) -> &Token;
}

/// Base URLs of the built-in providers.
#[derive(Debug, Clone)]
pub struct ProviderUrls {
    pub dexscreener: String,
    pub coingecko: String,
}

impl Default for ProviderUrls {
    fn default() -> Self {
        Self {
            dexscreener: DEXSCREENER_API_URL.to_string(),
            coingecko: COINGECKO_API_URL.to_string(),
        }
    }
}

/// Build the provider chain for a token, in priority order:
/// DexScreener by address, by symbol, by name, then CoinGecko.
/// Lookups the token has no identifier for are left out.
pub fn standard_chain(http: &Client, token: &Token, urls: &ProviderUrls) -> FallbackChain {
    let mut chain = FallbackChain::default();

    if token.address.is_some() {
        chain = chain.push(DexScreenerProvider::with_base_url(
            http.clone(),
            DexQuery::Address,
            &urls.dexscreener,
        ));
    }

    chain = chain.push(DexScreenerProvider::with_base_url(
        http.clone(),
        DexQuery::Symbol,
        &urls.dexscreener,
    ));

    if !token.name_is_symbol() {
        chain = chain.push(DexScreenerProvider::with_base_url(
            http.clone(),
            DexQuery::Name,
            &urls.dexscreener,
        ));
    }

    if token.coingecko_id.is_some() {
        chain = chain.push(CoinGeckoProvider::with_base_url(http.clone(), &urls.coingecko));
    }

    chain
}

/// Price cache in front of a provider (usually a `FallbackChain`).
///
/// The cache lock is held while refreshing, so concurrent callers share a
/// single outbound fetch.
pub struct PriceService {
    token: Token,
    provider: Box<dyn PriceProvider>,
    cache: Mutex<TtlCache<Price>>,
}

impl PriceService {
    pub fn new(token: Token, provider: impl PriceProvider + 'static, ttl: Duration) -> Self {
        Self {
            token,
            provider: Box::new(provider),
            cache: Mutex::new(TtlCache::new(ttl)),
        }
    }
}

#[async_trait]
impl PriceSource for PriceService {
    async fn get_price(&self) -> Option<Price> {
        let mut cache = self.cache.lock().await;

        if let Some(price) = cache.get() {
            debug!(symbol = %self.token.symbol, price = price.to_f64(), "Price cache hit");
            return Some(price);
        }

        match self.provider.fetch_price(&self.token).await {
            Ok(price) => {
                cache.store(price);
                Some(price)
            }
            Err(e) => {
                warn!(
                    symbol = %self.token.symbol,
                    error = %e,
                    "No price available from any provider"
                );
                None
            }
        }
    }

    fn token(&self) -> &Token {
        &self.token
    }
}
