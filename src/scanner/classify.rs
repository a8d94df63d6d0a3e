//! Regime classification pipeline
//!
//! `classify` fans out to the price and indicator clients, joins both
//! results, runs the configured decision strategy, and maps every failure
//! to the "unknown" result shape. The caller never sees an error.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::data::{
    normalize_symbol, DataError, DataResult, IndicatorProvider, IndicatorSnapshot, PriceProvider,
};

use super::strategy::{DecisionContext, DecisionStrategy, Regime};

/// Result of classifying one symbol. Produced fresh per invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub symbol: String,
    pub regime: Regime,
    pub confidence: f64,
    #[serde(rename = "lastPrice")]
    pub last_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indicators: Option<IndicatorSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Classification {
    /// The error-mapped shape: zero confidence, NaN price, no indicators,
    /// and a `model` tag naming the failure cause.
    pub fn unknown(symbol: String, err: &DataError) -> Self {
        Self {
            symbol,
            regime: Regime::Unknown,
            confidence: 0.0,
            last_price: f64::NAN,
            indicators: None,
            model: Some(err.model_tag()),
        }
    }
}

pub struct RegimeClassifier {
    price: Arc<dyn PriceProvider>,
    indicators: Arc<dyn IndicatorProvider>,
    strategy: Arc<dyn DecisionStrategy>,
}

impl RegimeClassifier {
    pub fn new(
        price: Arc<dyn PriceProvider>,
        indicators: Arc<dyn IndicatorProvider>,
        strategy: Arc<dyn DecisionStrategy>,
    ) -> Self {
        Self {
            price,
            indicators,
            strategy,
        }
    }

    /// Classify a symbol. Never fails: any upstream or judge error is
    /// caught here, logged, and converted into the unknown result.
    pub async fn classify(&self, symbol: &str) -> Classification {
        let symbol = normalize_symbol(symbol);

        match self.try_classify(&symbol).await {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(symbol = %symbol, error = %err, "classification failed");
                Classification::unknown(symbol, &err)
            }
        }
    }

    async fn try_classify(&self, symbol: &str) -> DataResult<Classification> {
        // Fan-out/join: both reads must complete before deciding. Either
        // branch failing fails the step as a whole.
        let (last_price, snapshot) = tokio::try_join!(
            self.price.fetch_last_price(symbol),
            self.indicators.fetch_indicators(symbol),
        )?;

        let ctx = DecisionContext {
            symbol: symbol.to_string(),
            last_price,
            ema20: snapshot.ema20,
            adx: snapshot.adx,
            ema200: None,
            pct_change_1h: None,
        };
        let decision = self.strategy.decide(&ctx).await?;

        Ok(Classification {
            symbol: symbol.to_string(),
            regime: decision.regime,
            confidence: decision.confidence.clamp(0.0, 1.0),
            last_price,
            indicators: Some(snapshot),
            model: decision.model,
        })
    }
}
