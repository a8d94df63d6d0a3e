//! MCP server: JSON-RPC dispatch to the tool adapter
//!
//! Every failure resolves to a protocol-level response; nothing here is
//! fatal to the process.

use serde_json::{json, Value};

use super::protocol::{error_codes, JsonRpcRequest, JsonRpcResponse, PROTOCOL_VERSION};
use super::tool::{ClassifyTool, TOOL_NAME};
use crate::scanner::RegimeClassifier;

pub const SERVER_NAME: &str = "crypto-scanner";

pub struct McpServer {
    tool: ClassifyTool,
}

impl McpServer {
    pub fn new(classifier: RegimeClassifier) -> Self {
        Self {
            tool: ClassifyTool::new(classifier),
        }
    }

    /// Handle one raw message. Returns the serialized response, or `None`
    /// for notifications and unanswerable garbage.
    pub async fn handle_message(&self, raw: &str) -> Option<String> {
        let request: JsonRpcRequest = match serde_json::from_str(raw) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!("unparseable message: {}", e);
                let response = JsonRpcResponse::error(
                    Value::Null,
                    error_codes::PARSE_ERROR,
                    format!("parse error: {}", e),
                );
                return serde_json::to_string(&response).ok();
            }
        };

        let response = self.handle_request(request).await?;
        serde_json::to_string(&response).ok()
    }

    /// Dispatch one parsed request. Notifications yield no response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            tracing::debug!(method = %request.method, "notification ignored");
            return None;
        }
        let id = request.id.unwrap_or(Value::Null);

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(
                id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "serverInfo": {
                        "name": SERVER_NAME,
                        "version": env!("CARGO_PKG_VERSION")
                    },
                    "capabilities": { "tools": {} }
                }),
            ),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(
                id,
                json!({ "tools": [ClassifyTool::definition()] }),
            ),
            "tools/call" => self.handle_tool_call(id, request.params.as_ref()).await,
            other => JsonRpcResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("unknown method: {}", other),
            ),
        };

        Some(response)
    }

    async fn handle_tool_call(&self, id: Value, params: Option<&Value>) -> JsonRpcResponse {
        let name = params.and_then(|p| p.get("name")).and_then(Value::as_str);

        match name {
            Some(TOOL_NAME) => {
                let arguments = params.and_then(|p| p.get("arguments"));
                match self.tool.call(arguments).await {
                    Ok(result) => JsonRpcResponse::success(id, result),
                    Err(invalid) => JsonRpcResponse::error(
                        id,
                        error_codes::INVALID_PARAMS,
                        invalid.to_string(),
                    ),
                }
            }
            Some(other) => JsonRpcResponse::success(
                id,
                json!({
                    "content": [{ "type": "text", "text": format!("Unknown tool {}", other) }],
                    "isError": true
                }),
            ),
            None => JsonRpcResponse::error(
                id,
                error_codes::INVALID_PARAMS,
                "missing tool name",
            ),
        }
    }
}
