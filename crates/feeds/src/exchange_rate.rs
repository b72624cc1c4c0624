//! USD to display-currency exchange rate.
//!
//! Fetches the rate from a public API and keeps it for a longer TTL than prices.

use crate::cache::TtlCache;
use crate::error::FeedError;
use crate::http::get_json;
use pricebot_core::Price;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// open.er-api.com base URL.
pub const EXCHANGE_RATE_API_URL: &str = "https://open.er-api.com";

/// Default exchange rate cache TTL.
pub const DEFAULT_RATE_TTL: Duration = Duration::from_secs(3600);

/// Exchange rate response from API.
#[derive(Debug, Deserialize)]
struct ExchangeRateResponse {
    /// "success" or "error"
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    rates: HashMap<String, f64>,
}

/// Cached USD -> `currency` rate.
pub struct ExchangeRateService {
    http: Client,
    base_url: String,
    currency: String,
    cache: Mutex<TtlCache<f64>>,
}

impl ExchangeRateService {
    pub fn new(http: Client, currency: &str, ttl: Duration) -> Self {
        Self::with_base_url(http, currency, ttl, EXCHANGE_RATE_API_URL)
    }

    pub fn with_base_url(http: Client, currency: &str, ttl: Duration, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            currency: currency.trim().to_uppercase(),
            cache: Mutex::new(TtlCache::new(ttl)),
        }
    }

    /// Target currency code (uppercase).
    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn is_usd(&self) -> bool {
        self.currency == "USD"
    }

    /// Units of the display currency per USD. `None` if no fresh rate could be obtained.
    pub async fn get_rate(&self) -> Option<f64> {
        if self.is_usd() {
            return Some(1.0);
        }

        let mut cache = self.cache.lock().await;
        if let Some(rate) = cache.get() {
            return Some(rate);
        }

        match self.fetch_rate().await {
            Ok(rate) => {
                info!("Updated USD/{} exchange rate: {:.4}", self.currency, rate);
                cache.store(rate);
                Some(rate)
            }
            Err(e) => {
                warn!("Failed to fetch USD/{} exchange rate: {}", self.currency, e);
                None
            }
        }
    }

    /// Convert a USD price into the display currency.
    pub async fn convert(&self, price: Price) -> Option<Price> {
        let rate = self.get_rate().await?;
        price.convert(rate)
    }

    async fn fetch_rate(&self) -> Result<f64, FeedError> {
        let request = self.http.get(format!("{}/v6/latest/USD", self.base_url));
        let response: ExchangeRateResponse = get_json(request).await?;

        if response.result.as_deref() == Some("error") {
            return Err(FeedError::NoData("exchange rate API reported an error".into()));
        }

        response
            .rates
            .get(&self.currency)
            .copied()
            .filter(|rate| rate.is_finite() && *rate > 0.0)
            .ok_or_else(|| FeedError::NoData(format!("{} rate not found in response", self.currency)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{build_client, DEFAULT_TIMEOUT};

    const RATES_BODY: &str = r#"{"result":"success","base_code":"USD","rates":{"USD":1,"EUR":0.92,"KRW":1350.25}}"#;

    fn service(url: &str, currency: &str) -> ExchangeRateService {
        ExchangeRateService::with_base_url(
            build_client(DEFAULT_TIMEOUT).unwrap(),
            currency,
            DEFAULT_RATE_TTL,
            url,
        )
    }

    #[tokio::test]
    async fn test_usd_needs_no_fetch() {
        let rates = service("http://127.0.0.1:9", "usd");
        assert!(rates.is_usd());
        assert_eq!(rates.get_rate().await, Some(1.0));
    }

    #[tokio::test]
    async fn test_rate_is_cached() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v6/latest/USD")
            .with_status(200)
            .with_body(RATES_BODY)
            .expect(1)
            .create_async()
            .await;

        let rates = service(&server.url(), "krw");
        assert_eq!(rates.currency(), "KRW");
        assert_eq!(rates.get_rate().await, Some(1350.25));
        assert_eq!(rates.get_rate().await, Some(1350.25));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_refetched_after_ttl() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v6/latest/USD")
            .with_status(200)
            .with_body(RATES_BODY)
            .expect(2)
            .create_async()
            .await;

        let rates = service(&server.url(), "EUR");
        assert_eq!(rates.get_rate().await, Some(0.92));

        // Jump past the TTL, then let the clock run again for the HTTP call
        tokio::time::pause();
        tokio::time::advance(DEFAULT_RATE_TTL - Duration::from_secs(1)).await;
        assert_eq!(rates.get_rate().await, Some(0.92));
        tokio::time::advance(Duration::from_secs(2)).await;
        tokio::time::resume();

        assert_eq!(rates.get_rate().await, Some(0.92));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("GET", "/v6/latest/USD")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;

        let rates = service(&server.url(), "EUR");
        assert_eq!(rates.get_rate().await, None);
        failing.assert_async().await;
        failing.remove_async().await;

        let ok = server
            .mock("GET", "/v6/latest/USD")
            .with_status(200)
            .with_body(RATES_BODY)
            .expect(1)
            .create_async()
            .await;

        assert_eq!(rates.get_rate().await, Some(0.92));
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn test_convert() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v6/latest/USD")
            .with_status(200)
            .with_body(RATES_BODY)
            .create_async()
            .await;

        let rates = service(&server.url(), "EUR");
        let converted = rates.convert(Price::new(100.0).unwrap()).await.unwrap();
        assert!((converted.to_f64() - 92.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_missing_currency() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v6/latest/USD")
            .with_status(200)
            .with_body(RATES_BODY)
            .create_async()
            .await;

        let rates = service(&server.url(), "XYZ");
        assert_eq!(rates.get_rate().await, None);
    }

    #[tokio::test]
    async fn test_api_error_result() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v6/latest/USD")
            .with_status(200)
            .with_body(r#"{"result":"error","error-type":"unsupported-code"}"#)
            .create_async()
            .await;

        let rates = service(&server.url(), "EUR");
        assert_eq!(rates.get_rate().await, None);
    }
}
