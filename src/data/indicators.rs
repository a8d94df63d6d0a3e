//! Indicator client for the taapi.io technical-analysis API
//!
//! Fetches the 1h EMA-20 and ADX readings for a symbol, both issued
//! concurrently, with a short-lived cache in front to respect the
//! provider's rate limit.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::cache::IndicatorCache;
use super::{normalize_symbol, DataError, DataResult};

/// Candle interval every indicator request is pinned to.
const INTERVAL: &str = "1h";
/// Exchange whose candles the provider reads.
const EXCHANGE: &str = "binance";
/// Quote asset appended to the symbol for the trading pair.
const QUOTE_ASSET: &str = "USDT";
/// EMA lookback period.
const EMA_PERIOD: &str = "20";

/// Most recent 1h technical reading for a symbol. Immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub ema20: f64,
    pub adx: f64,
}

/// The two indicators the scanner reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorKind {
    Ema20,
    Adx,
}

impl IndicatorKind {
    fn endpoint(&self) -> &'static str {
        match self {
            IndicatorKind::Ema20 => "ema",
            IndicatorKind::Adx => "adx",
        }
    }
}

/// Raw single-indicator read against the provider.
#[async_trait]
pub trait IndicatorSource: Send + Sync {
    async fn read_value(&self, kind: IndicatorKind, symbol: &str) -> DataResult<f64>;
}

/// taapi.io response body; every indicator endpoint returns a `value` field.
#[derive(Debug, Deserialize)]
struct IndicatorValue {
    value: f64,
}

/// HTTP source hitting taapi.io.
pub struct TaapiSource {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl TaapiSource {
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
}

#[async_trait]
impl IndicatorSource for TaapiSource {
    async fn read_value(&self, kind: IndicatorKind, symbol: &str) -> DataResult<f64> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            DataError::Config("TAAPI_KEY environment variable is not set".to_string())
        })?;

        let url = format!("{}/{}", self.base_url, kind.endpoint());
        let pair = format!("{}/{}", symbol, QUOTE_ASSET);
        let mut params = vec![
            ("secret", api_key.as_str()),
            ("exchange", EXCHANGE),
            ("symbol", pair.as_str()),
            ("interval", INTERVAL),
        ];
        if kind == IndicatorKind::Ema20 {
            params.push(("optInTimePeriod", EMA_PERIOD));
        }

        tracing::debug!(endpoint = kind.endpoint(), %symbol, "indicator request");

        let response = self.client.get(&url).query(&params).send().await?;

        if !response.status().is_success() {
            let status_code = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!(
                endpoint = kind.endpoint(),
                status_code,
                "indicator provider failed: {}",
                message
            );
            return Err(DataError::api_error(status_code, message));
        }

        let body: IndicatorValue = response.json().await?;
        Ok(body.value)
    }
}

/// Fetches both indicators for a symbol, asynchronous, cache in front.
#[async_trait]
pub trait IndicatorProvider: Send + Sync {
    async fn fetch_indicators(&self, symbol: &str) -> DataResult<IndicatorSnapshot>;
}

/// Indicator client: cache lookup, then a concurrent EMA-20/ADX read pair.
pub struct TaapiClient<S: IndicatorSource> {
    source: S,
    cache: IndicatorCache,
}

impl<S: IndicatorSource> TaapiClient<S> {
    pub fn new(source: S, cache: IndicatorCache) -> Self {
        Self { source, cache }
    }
}

#[async_trait]
impl<S: IndicatorSource> IndicatorProvider for TaapiClient<S> {
    /// On a fresh cache hit, returns without touching the provider. On a
    /// miss or stale entry, issues both reads concurrently; if either fails
    /// the whole fetch fails and nothing is cached.
    async fn fetch_indicators(&self, symbol: &str) -> DataResult<IndicatorSnapshot> {
        let key = normalize_symbol(symbol);

        if let Some(snapshot) = self.cache.get(&key).await {
            tracing::debug!(symbol = %key, "indicator cache hit");
            return Ok(snapshot);
        }

        let (ema20, adx) = tokio::try_join!(
            self.source.read_value(IndicatorKind::Ema20, &key),
            self.source.read_value(IndicatorKind::Adx, &key),
        )?;

        let snapshot = IndicatorSnapshot { ema20, adx };
        self.cache.put(&key, snapshot).await;

        tracing::debug!(symbol = %key, ema20, adx, "indicator snapshot cached");
        Ok(snapshot)
    }
}
