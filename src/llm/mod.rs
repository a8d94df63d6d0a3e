//! LLM judge: delegates the regime decision to a chat-completion model
//! The verdict must validate against a fixed schema; anything malformed is
//! a judge error the classifier recovers from like any upstream failure.

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client as OpenAIClient,
};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::timeout;
use tracing::info;

use crate::data::{DataError, DataResult};
use crate::scanner::{Decision, DecisionContext, DecisionStrategy, Regime};

/// Judge configuration
#[derive(Debug, Clone)]
pub struct JudgeConfig {
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            timeout_seconds: 30,
        }
    }
}

/// Raw verdict shape the model must produce.
#[derive(Debug, Deserialize)]
struct JudgeVerdict {
    regime: String,
    confidence: f64,
}

/// Decision strategy backed by an OpenAI-compatible chat model.
pub struct LlmJudge {
    client: OpenAIClient<OpenAIConfig>,
    config: JudgeConfig,
}

impl LlmJudge {
    pub fn new(api_key: &str, config: JudgeConfig) -> Self {
        let openai_config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: OpenAIClient::with_config(openai_config),
            config,
        }
    }

    fn build_prompt(ctx: &DecisionContext) -> String {
        let fmt_opt = |v: Option<f64>| match v {
            Some(v) => format!("{}", v),
            None => "N/A".to_string(),
        };

        format!(
            "You are a professional crypto analyst.\n\
             Given the 1-hour data for {}:\n\
             - EMA-20:  {}\n\
             - EMA-200: {}\n\
             - ADX:     {}\n\
             - 1h % change: {}\n\n\
             If price shows directional momentum (ADX > 25 or |1h % change| > 1%) \
             answer \"trending\", otherwise \"ranging\".\n\
             Respond only with JSON of the form \
             {{\"regime\": \"trending\" | \"ranging\", \"confidence\": <number in [0,1]>}}.",
            ctx.symbol,
            ctx.ema20,
            fmt_opt(ctx.ema200),
            ctx.adx,
            fmt_opt(ctx.pct_change_1h),
        )
    }

    /// Validate the model's output against the verdict schema. Out-of-range
    /// confidence or an unexpected regime string is a schema violation.
    fn parse_verdict(content: &str) -> DataResult<(Regime, f64)> {
        let raw = serde_json::from_str::<JudgeVerdict>(content)
            .ok()
            .or_else(|| {
                extract_json_object(content)
                    .and_then(|json| serde_json::from_str::<JudgeVerdict>(&json).ok())
            })
            .ok_or_else(|| DataError::judge_error("verdict is not valid JSON"))?;

        let regime = match raw.regime.as_str() {
            "trending" => Regime::Trending,
            "ranging" => Regime::Ranging,
            other => {
                return Err(DataError::judge_error(format!(
                    "verdict regime '{}' is outside the schema",
                    other
                )))
            }
        };

        if !(0.0..=1.0).contains(&raw.confidence) || !raw.confidence.is_finite() {
            return Err(DataError::judge_error(format!(
                "verdict confidence {} is outside [0, 1]",
                raw.confidence
            )));
        }

        Ok((regime, raw.confidence))
    }
}

#[async_trait]
impl DecisionStrategy for LlmJudge {
    async fn decide(&self, ctx: &DecisionContext) -> DataResult<Decision> {
        let prompt = Self::build_prompt(ctx);

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.config.model)
            .response_format(ResponseFormat::JsonObject)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content("You classify crypto price regimes. Respond with JSON only.")
                    .build()
                    .map_err(|e| DataError::judge_error(e.to_string()))?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()
                    .map_err(|e| DataError::judge_error(e.to_string()))?
                    .into(),
            ])
            .build()
            .map_err(|e| DataError::judge_error(e.to_string()))?;

        let response = timeout(
            Duration::from_secs(self.config.timeout_seconds),
            self.client.chat().create(request),
        )
        .await
        .map_err(|_| DataError::Timeout {
            timeout_seconds: self.config.timeout_seconds,
        })?
        .map_err(|e| DataError::judge_error(e.to_string()))?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| DataError::judge_error("model returned no content"))?;

        let (regime, confidence) = Self::parse_verdict(&content)?;

        info!(
            symbol = %ctx.symbol,
            model = %self.config.model,
            regime = regime.as_str(),
            confidence,
            "judge verdict accepted"
        );

        Ok(Decision {
            regime,
            confidence,
            model: Some(self.config.model.clone()),
        })
    }
}

/// Pull the first balanced `{...}` object out of text that may wrap the
/// JSON in markdown fences or prose.
fn extract_json_object(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let mut depth = 0;
    for (i, c) in text[start..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..start + i + 1].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> DecisionContext {
        DecisionContext {
            symbol: "BTC".to_string(),
            last_price: 45_000.0,
            ema20: 44_500.0,
            adx: 30.0,
            ema200: Some(43_000.0),
            pct_change_1h: None,
        }
    }

    #[test]
    fn test_parse_valid_verdict() {
        let (regime, confidence) =
            LlmJudge::parse_verdict(r#"{"regime": "trending", "confidence": 0.82}"#)
                .expect("valid verdict");
        assert_eq!(regime, Regime::Trending);
        assert_eq!(confidence, 0.82);
    }

    #[test]
    fn test_parse_fenced_verdict() {
        let content = "```json\n{\"regime\": \"ranging\", \"confidence\": 0.5}\n```";
        let (regime, confidence) = LlmJudge::parse_verdict(content).expect("fenced verdict");
        assert_eq!(regime, Regime::Ranging);
        assert_eq!(confidence, 0.5);
    }

    #[test]
    fn test_unknown_regime_violates_schema() {
        let err = LlmJudge::parse_verdict(r#"{"regime": "sideways", "confidence": 0.5}"#)
            .expect_err("regime outside enum");
        assert!(matches!(err, DataError::Judge { .. }));
    }

    #[test]
    fn test_out_of_range_confidence_violates_schema() {
        assert!(LlmJudge::parse_verdict(r#"{"regime": "trending", "confidence": 1.2}"#).is_err());
        assert!(LlmJudge::parse_verdict(r#"{"regime": "trending", "confidence": -0.1}"#).is_err());
    }

    #[test]
    fn test_non_json_verdict_is_rejected() {
        assert!(LlmJudge::parse_verdict("the market looks trendy").is_err());
    }

    #[test]
    fn test_prompt_carries_indicator_values() {
        let prompt = LlmJudge::build_prompt(&ctx());
        assert!(prompt.contains("BTC"));
        assert!(prompt.contains("44500"));
        assert!(prompt.contains("43000"));
        assert!(prompt.contains("N/A"));
    }
}
