use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Default freshness window for cached indicator snapshots.
const DEFAULT_CACHE_FRESHNESS_MS: i64 = 65_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub providers: ProviderConfig,
    pub scanner: ScannerConfig,
    pub llm: LlmConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub taapi_key: Option<String>,
    pub taapi_base_url: String,
    pub cmc_key: Option<String>,
    pub cmc_base_url: String,
    pub openai_api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Which decision strategy classifies: "rule" or "llm"
    pub strategy: String,
    pub cache_freshness_ms: i64,
    pub indicator_timeout_seconds: u64,
    pub price_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file - sets env vars that aren't already set
        dotenv::dotenv().ok();

        let config = Config {
            providers: ProviderConfig {
                taapi_key: env::var("TAAPI_KEY").ok(),
                taapi_base_url: env::var("TAAPI_BASE_URL")
                    .unwrap_or_else(|_| "https://api.taapi.io".to_string()),
                cmc_key: env::var("CMC_KEY").ok(),
                cmc_base_url: env::var("CMC_BASE_URL")
                    .unwrap_or_else(|_| "https://pro-api.coinmarketcap.com".to_string()),
                openai_api_key: env::var("OPENAI_API_KEY").ok(),
            },
            scanner: ScannerConfig {
                strategy: env::var("DECISION_STRATEGY").unwrap_or_else(|_| "rule".to_string()),
                cache_freshness_ms: env::var("CACHE_FRESHNESS_MS")
                    .unwrap_or_else(|_| DEFAULT_CACHE_FRESHNESS_MS.to_string())
                    .parse()
                    .context("Invalid CACHE_FRESHNESS_MS value")?,
                indicator_timeout_seconds: env::var("INDICATOR_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| "8".to_string())
                    .parse()
                    .context("Invalid INDICATOR_TIMEOUT_SECONDS value")?,
                price_timeout_seconds: env::var("PRICE_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .context("Invalid PRICE_TIMEOUT_SECONDS value")?,
            },
            llm: LlmConfig {
                model: env::var("JUDGE_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
                timeout_seconds: env::var("LLM_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .context("Invalid LLM_TIMEOUT_SECONDS value")?,
            },
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8787".to_string())
                    .parse()
                    .context("Invalid PORT value")?,
            },
        };

        Ok(config)
    }

    /// Provider keys that are expected but absent. The bootstrap warns on
    /// startup; core calls without a key fail into the error-mapped result.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.providers.taapi_key.is_none() {
            missing.push("TAAPI_KEY");
        }
        if self.providers.cmc_key.is_none() {
            missing.push("CMC_KEY");
        }
        if self.scanner.strategy == "llm" && self.providers.openai_api_key.is_none() {
            missing.push("OPENAI_API_KEY");
        }
        missing
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            providers: ProviderConfig {
                taapi_key: None,
                taapi_base_url: "https://api.taapi.io".to_string(),
                cmc_key: None,
                cmc_base_url: "https://pro-api.coinmarketcap.com".to_string(),
                openai_api_key: None,
            },
            scanner: ScannerConfig {
                strategy: "rule".to_string(),
                cache_freshness_ms: DEFAULT_CACHE_FRESHNESS_MS,
                indicator_timeout_seconds: 8,
                price_timeout_seconds: 5,
            },
            llm: LlmConfig {
                model: "gpt-4o".to_string(),
                timeout_seconds: 30,
            },
            server: ServerConfig { port: 8787 },
        }
    }
}
