//! Price client for the CoinMarketCap quotes API
//!
//! One live request per call, no caching, bounded timeout so a hung
//! upstream cannot stall a classify call indefinitely.

use async_trait::async_trait;
use serde_json::Value;

use super::{normalize_symbol, DataError, DataResult};

const QUOTES_PATH: &str = "/v2/cryptocurrency/quotes/latest";
const API_KEY_HEADER: &str = "X-CMC_PRO_API_KEY";

/// Latest USD quote for a symbol.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    async fn fetch_last_price(&self, symbol: &str) -> DataResult<f64>;
}

pub struct CmcClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl CmcClient {
    pub fn new(base_url: String, api_key: Option<String>, timeout_seconds: u64) -> DataResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .user_agent(concat!("crypto-scanner/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(DataError::Network)?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Pulls the USD price out of the provider's nested response:
    /// `data[symbol][0].quote.USD.price`. A missing symbol or a shape
    /// mismatch is a lookup failure, not a panic.
    fn extract_price(body: &Value, symbol: &str) -> DataResult<f64> {
        body["data"][symbol][0]["quote"]["USD"]["price"]
            .as_f64()
            .ok_or_else(|| {
                DataError::parse_error(format!(
                    "no USD quote for {} in market-data response",
                    symbol
                ))
            })
    }
}

#[async_trait]
impl PriceProvider for CmcClient {
    async fn fetch_last_price(&self, symbol: &str) -> DataResult<f64> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            DataError::Config("CMC_KEY environment variable is not set".to_string())
        })?;

        let symbol = normalize_symbol(symbol);
        let url = format!("{}{}", self.base_url, QUOTES_PATH);

        tracing::debug!(%symbol, "quote request");

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, api_key)
            .query(&[("symbol", symbol.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status_code = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!(status_code, "market-data provider failed: {}", message);
            return Err(DataError::api_error(status_code, message));
        }

        let body: Value = response.json().await?;
        Self::extract_price(&body, &symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn quote_body(symbol: &str, price: f64) -> Value {
        let mut body = json!({ "data": {} });
        body["data"][symbol] = json!([{ "quote": { "USD": { "price": price } } }]);
        body
    }

    #[test]
    fn test_extract_price_from_nested_response() {
        let body = quote_body("BTC", 45_123.5);
        let price = CmcClient::extract_price(&body, "BTC").expect("price present");
        assert_eq!(price, 45_123.5);
    }

    #[test]
    fn test_extract_price_missing_symbol_is_lookup_error() {
        let body = quote_body("BTC", 45_123.5);
        let err = CmcClient::extract_price(&body, "ETH").expect_err("symbol absent");
        assert!(matches!(err, DataError::Parse { .. }));
        assert_eq!(err.model_tag(), "error_n/a");
    }

    #[test]
    fn test_extract_price_shape_mismatch_is_lookup_error() {
        let body = json!({ "data": { "BTC": { "quote": {} } } });
        assert!(CmcClient::extract_price(&body, "BTC").is_err());
    }
}
