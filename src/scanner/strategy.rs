//! Decision strategies
//!
//! The regime decision is a pluggable capability: the threshold rule is the
//! required baseline, the LLM judge (see `crate::llm`) an optional
//! alternative selected by configuration. Both conform to the same contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::data::DataResult;

/// ADX level above which momentum counts as a strong trend.
pub const ADX_TREND_THRESHOLD: f64 = 25.0;

/// ADX level at which rule-based confidence saturates at 1.
const ADX_FULL_CONFIDENCE: f64 = 50.0;

/// Short-term price regime classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    /// Directional momentum: price above EMA-20 with a strong ADX
    Trending,
    /// Range-bound, no clear direction
    Ranging,
    /// Pipeline failure; carries zero confidence and an error tag
    Unknown,
}

impl Regime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Regime::Trending => "trending",
            Regime::Ranging => "ranging",
            Regime::Unknown => "unknown",
        }
    }
}

/// Inputs available to a decision strategy for one symbol.
#[derive(Debug, Clone)]
pub struct DecisionContext {
    pub symbol: String,
    pub last_price: f64,
    pub ema20: f64,
    pub adx: f64,
    pub ema200: Option<f64>,
    pub pct_change_1h: Option<f64>,
}

/// Outcome of a decision: regime (trending or ranging only), confidence in
/// [0, 1], and an optional tag naming the decision source.
#[derive(Debug, Clone)]
pub struct Decision {
    pub regime: Regime,
    pub confidence: f64,
    pub model: Option<String>,
}

#[async_trait]
pub trait DecisionStrategy: Send + Sync {
    async fn decide(&self, ctx: &DecisionContext) -> DataResult<Decision>;
}

/// Baseline threshold rule: trending when price sits above the EMA-20 and
/// ADX exceeds 25; confidence scales with trend strength.
#[derive(Debug, Default)]
pub struct RuleStrategy;

#[async_trait]
impl DecisionStrategy for RuleStrategy {
    async fn decide(&self, ctx: &DecisionContext) -> DataResult<Decision> {
        let trending = ctx.last_price > ctx.ema20 && ctx.adx > ADX_TREND_THRESHOLD;

        let (regime, confidence) = if trending {
            (Regime::Trending, (ctx.adx / ADX_FULL_CONFIDENCE).min(1.0))
        } else {
            (Regime::Ranging, 0.5)
        };

        Ok(Decision {
            regime,
            confidence,
            model: None,
        })
    }
}
