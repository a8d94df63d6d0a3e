//! Tool adapter: exposes the classifier as a schema-described MCP tool
//!
//! Arguments are validated before the classifier runs, so a bad request
//! never costs a provider call. Validation failures are request-level
//! rejections, distinct from a successful "unknown" classification.

use serde_json::{json, Value};

use crate::scanner::RegimeClassifier;

pub const TOOL_NAME: &str = "classify_asset";
const TOOL_TITLE: &str = "Classify a crypto asset";
const TOOL_DESCRIPTION: &str = "Return \"trending\" or \"ranging\" for the given symbol";

/// Rejection raised before the classifier is invoked.
#[derive(Debug, PartialEq, Eq)]
pub struct InvalidArguments(pub String);

impl std::fmt::Display for InvalidArguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub struct ClassifyTool {
    classifier: RegimeClassifier,
}

impl ClassifyTool {
    pub fn new(classifier: RegimeClassifier) -> Self {
        Self { classifier }
    }

    /// Self-describing tool definition for `tools/list`.
    pub fn definition() -> Value {
        json!({
            "name": TOOL_NAME,
            "title": TOOL_TITLE,
            "description": TOOL_DESCRIPTION,
            "inputSchema": {
                "type": "object",
                "required": ["symbol"],
                "properties": {
                    "symbol": {
                        "type": "string",
                        "minLength": 1,
                        "description": "Crypto symbol, e.g. BTC or ETH"
                    }
                }
            },
            "outputSchema": {
                "type": "object",
                "required": ["symbol", "regime", "confidence", "lastPrice"],
                "properties": {
                    "symbol": { "type": "string" },
                    "regime": { "type": "string", "enum": ["trending", "ranging", "unknown"] },
                    "confidence": { "type": "number", "minimum": 0, "maximum": 1 },
                    "lastPrice": { "type": ["number", "null"] },
                    "indicators": {
                        "type": "object",
                        "properties": {
                            "ema20": { "type": "number" },
                            "adx": { "type": "number" }
                        }
                    },
                    "model": { "type": "string" }
                }
            }
        })
    }

    /// Validate the request arguments against the input schema: `symbol`
    /// must be a non-empty string.
    pub fn parse_arguments(arguments: Option<&Value>) -> Result<String, InvalidArguments> {
        let args = arguments
            .ok_or_else(|| InvalidArguments("missing arguments object".to_string()))?;

        let symbol = args
            .get("symbol")
            .ok_or_else(|| InvalidArguments("missing required argument: symbol".to_string()))?
            .as_str()
            .ok_or_else(|| InvalidArguments("symbol must be a string".to_string()))?;

        if symbol.trim().is_empty() {
            return Err(InvalidArguments("symbol must not be empty".to_string()));
        }

        Ok(symbol.to_string())
    }

    /// Run the tool: validate, classify, wrap in the transport envelope.
    pub async fn call(&self, arguments: Option<&Value>) -> Result<Value, InvalidArguments> {
        let symbol = Self::parse_arguments(arguments)?;

        let result = self.classifier.classify(&symbol).await;
        let structured = serde_json::to_value(&result)
            .map_err(|e| InvalidArguments(format!("failed to serialize result: {}", e)))?;
        let text = structured.to_string();

        Ok(json!({
            "content": [{ "type": "text", "text": text }],
            "structuredContent": structured,
            "isError": false
        }))
    }
}
