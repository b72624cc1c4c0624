//! Token price collection from public market-data APIs.
//!
//! ## Architecture
//!
//! - `provider` - `PriceProvider` strategy trait and the `FallbackChain` combinator
//! - `dexscreener`, `coingecko` - concrete providers
//! - `cache` - TTL cache shared by the price and exchange-rate services
//! - `service` - `PriceService`: cache in front of the provider chain
//! - `exchange_rate` - USD to display-currency conversion

pub mod cache;
pub mod coingecko;
pub mod dexscreener;
pub mod error;
pub mod exchange_rate;
pub mod http;
pub mod provider;
pub mod service;

pub use cache::TtlCache;
pub use coingecko::CoinGeckoProvider;
pub use dexscreener::{DexQuery, DexScreenerProvider};
pub use error::*;
pub use exchange_rate::ExchangeRateService;
pub use provider::{FallbackChain, PriceProvider};
pub use service::{standard_chain, PriceService, PriceSource, ProviderUrls};
