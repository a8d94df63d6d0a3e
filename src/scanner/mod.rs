//! Regime scanner: classification pipeline and decision strategies

pub mod classify;
pub mod strategy;

pub use classify::{Classification, RegimeClassifier};
pub use strategy::{
    Decision, DecisionContext, DecisionStrategy, Regime, RuleStrategy, ADX_TREND_THRESHOLD,
};
