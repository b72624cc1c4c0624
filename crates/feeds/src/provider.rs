//! Price provider trait and the fallback combinator.
//!
//! Each external API (and each query term against it) is one `PriceProvider`.
//! `FallbackChain` tries them in order and returns the first success.

use crate::error::FeedError;
use async_trait::async_trait;
use pricebot_core::{Price, Token};
use tracing::{debug, warn};

/// A single strategy for obtaining a token's USD price.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Short label for logs (e.g., "dexscreener:address").
    fn name(&self) -> &str;

    /// Fetch the current USD price. An empty result is an error (`FeedError::NoData`).
    async fn fetch_price(&self, token: &Token) -> Result<Price, FeedError>;
}

/// Ordered list of providers; first success wins.
#[derive(Default)]
pub struct FallbackChain {
    providers: Vec<Box<dyn PriceProvider>>,
}

impl FallbackChain {
    /// Append a provider with the lowest priority so far.
    pub fn push(mut self, provider: impl PriceProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Provider labels in priority order.
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }
}

#[async_trait]
impl PriceProvider for FallbackChain {
    fn name(&self) -> &str {
        "fallback-chain"
    }

    async fn fetch_price(&self, token: &Token) -> Result<Price, FeedError> {
        let mut last_error = FeedError::NoProviders;

        for provider in &self.providers {
            match provider.fetch_price(token).await {
                Ok(price) => {
                    debug!(
                        provider = provider.name(),
                        symbol = %token.symbol,
                        price = price.to_f64(),
                        "Price fetched"
                    );
                    return Ok(price);
                }
                Err(e) => {
                    warn!(
                        provider = provider.name(),
                        symbol = %token.symbol,
                        error = %e,
                        transient = e.is_transient(),
                        "Price provider failed"
                    );
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}
