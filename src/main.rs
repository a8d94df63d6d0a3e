use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crypto_scanner::config::Config;
use crypto_scanner::data::{CmcClient, IndicatorCache, TaapiClient, TaapiSource};
use crypto_scanner::llm::{JudgeConfig, LlmJudge};
use crypto_scanner::mcp::{http, stdio, McpServer};
use crypto_scanner::scanner::{DecisionStrategy, RegimeClassifier, RuleStrategy};

#[derive(Parser)]
#[command(
    name = "crypto-scanner",
    about = "Crypto regime scanner served as an MCP tool",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the MCP tool over stdio (default)
    Stdio,

    /// Serve the MCP tool over HTTP
    Http {
        /// Port to bind (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Classify one symbol and print the result JSON
    Classify {
        /// Crypto symbol, e.g. BTC or ETH
        #[arg(short, long)]
        symbol: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    // Logs go to stderr: stdout belongs to the stdio transport.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "crypto-scanner starting up");

    for key in config.missing_keys() {
        warn!("{} missing - see README", key);
    }

    let classifier = build_classifier(&config)?;
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Stdio) {
        Commands::Stdio => {
            stdio::serve(McpServer::new(classifier)).await?;
        }
        Commands::Http { port } => {
            let port = port.unwrap_or(config.server.port);
            http::serve(McpServer::new(classifier), port).await?;
        }
        Commands::Classify { symbol } => {
            let result = classifier.classify(&symbol).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

/// Wire the classifier from configuration: live provider clients, the
/// shared indicator cache, and the configured decision strategy.
fn build_classifier(config: &Config) -> Result<RegimeClassifier> {
    let source = TaapiSource::new(
        config.providers.taapi_base_url.clone(),
        config.providers.taapi_key.clone(),
        config.scanner.indicator_timeout_seconds,
    )?;
    let cache = IndicatorCache::with_system_clock(config.scanner.cache_freshness_ms);
    let indicators = TaapiClient::new(source, cache);

    let price = CmcClient::new(
        config.providers.cmc_base_url.clone(),
        config.providers.cmc_key.clone(),
        config.scanner.price_timeout_seconds,
    )?;

    let strategy: Arc<dyn DecisionStrategy> = match config.scanner.strategy.as_str() {
        "llm" => {
            let api_key = config.providers.openai_api_key.clone().unwrap_or_default();
            Arc::new(LlmJudge::new(
                &api_key,
                JudgeConfig {
                    model: config.llm.model.clone(),
                    timeout_seconds: config.llm.timeout_seconds,
                },
            ))
        }
        _ => Arc::new(RuleStrategy),
    };

    Ok(RegimeClassifier::new(
        Arc::new(price),
        Arc::new(indicators),
        strategy,
    ))
}
