//! JSON-RPC 2.0 message envelopes and the MCP-style tool-listing shapes
//! this server needs. Trimmed to what a single-tool server actually uses —
//! no resources, prompts, or sampling capabilities.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::JsonRpcError;

pub const PROTOCOL_VERSION: &str = "2024-11-05";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: RequestId,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: RequestId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    #[must_use]
    pub fn success(id: RequestId, result: impl Serialize) -> Self {
        Self { jsonrpc: "2.0".to_string(), id, result: Some(serde_json::to_value(result).unwrap_or(Value::Null)), error: None }
    }

    #[must_use]
    pub fn error(id: RequestId, error: JsonRpcError) -> Self {
        Self { jsonrpc: "2.0".to_string(), id, result: None, error: Some(error) }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    Request(JsonRpcRequest),
    Response(JsonRpcResponse),
    Notification(JsonRpcNotification),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: ServerInfo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCapabilities {
    pub tools: Option<ToolsCapability>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsCapability {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListToolsResult {
    pub tools: Vec<McpToolDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    pub content: Vec<TextContent>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl CallToolResult {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self { content: vec![TextContent { text: text.into() }], is_error: false }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self { content: vec![TextContent { text: message.into() }], is_error: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextContent {
    pub text: String,
}

/// JSON-schema for the `deepResearch` tool's input: `query` required,
/// everything else optional with the defaults the orchestrator already
/// applies.
#[must_use]
pub fn deep_research_tool_definition() -> McpToolDefinition {
    McpToolDefinition {
        name: "deepResearch".to_string(),
        description: "Runs a recursive multi-source research pass over a topic and returns a single markdown report.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "The topic to research."},
                "depth": {"type": "integer", "minimum": 1, "maximum": 5, "description": "Recursion depth, default 2."},
                "breadth": {"type": "integer", "minimum": 1, "maximum": 5, "description": "SerpQueries per node, default 3."},
                "model": {"type": "string", "description": "provider:modelId override."},
                "tokenBudget": {"type": "integer", "minimum": 1, "description": "Total token cap across the pass."},
                "sourcePreferences": {"type": "string", "description": "Free-text source preferences passed to every stage."}
            },
            "required": ["query"]
        }),
    }
}
