//! The stdio JSON-RPC server loop. Newline-delimited JSON over stdin/
//! stdout, driven by tokio rather than an `async-io`/`futures-lite` pair —
//! this workspace is tokio end to end.

use scry_core::Governor;
use scry_fetch::Fetcher;
use scry_gateway::Gateway;
use scry_research::{Accumulators, TopicRequest};
use scry_search::SearXng;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::error::{JsonRpcError, Result};
use crate::protocol::{
    deep_research_tool_definition, CallToolParams, CallToolResult, InitializeResult,
    JsonRpcMessage, JsonRpcRequest, JsonRpcResponse, ListToolsResult, ServerCapabilities,
    ServerInfo, ToolsCapability, PROTOCOL_VERSION,
};

/// Everything the server needs to actually run a research pass.
pub struct ServerConfig {
    pub gateway: Gateway,
    pub search: SearXng,
    pub fetcher: Fetcher,
    pub governor: Governor,
    pub default_breadth: u8,
    pub default_depth: u8,
}

pub struct McpServer {
    config: ServerConfig,
    info: ServerInfo,
}

impl McpServer {
    #[must_use]
    pub fn new(config: ServerConfig, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self { config, info: ServerInfo { name: name.into(), version: version.into() } }
    }

    /// Runs the server loop against stdin/stdout until EOF.
    pub async fn run(&mut self) -> Result<()> {
        tracing::debug!("mcp server starting: {}", self.info.name);
        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut reader = BufReader::new(stdin);
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).await?;
            if bytes_read == 0 {
                tracing::debug!("stdin closed, shutting down");
                break;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let message: JsonRpcMessage = match serde_json::from_str(trimmed) {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to parse incoming message, skipping");
                    continue;
                }
            };

            if let JsonRpcMessage::Request(request) = message {
                let response = self.handle_request(request).await;
                let json = serde_json::to_string(&response)?;
                stdout.write_all(json.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }

        Ok(())
    }

    async fn handle_request(&mut self, req: JsonRpcRequest) -> JsonRpcResponse {
        tracing::debug!(method = %req.method, "handling request");
        match req.method.as_str() {
            "initialize" => self.handle_initialize(req),
            "tools/list" => self.handle_list_tools(req),
            "tools/call" => self.handle_call_tool(req).await,
            method => JsonRpcResponse::error(req.id, JsonRpcError::method_not_found(method)),
        }
    }

    fn handle_initialize(&mut self, req: JsonRpcRequest) -> JsonRpcResponse {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities { tools: Some(ToolsCapability {}) },
            server_info: self.info.clone(),
        };
        JsonRpcResponse::success(req.id, result)
    }

    fn handle_list_tools(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        let result = ListToolsResult { tools: vec![deep_research_tool_definition()] };
        JsonRpcResponse::success(req.id, result)
    }

    async fn handle_call_tool(&mut self, req: JsonRpcRequest) -> JsonRpcResponse {
        let params: CallToolParams = match req.params.map(serde_json::from_value).transpose() {
            Ok(Some(p)) => p,
            Ok(None) => return JsonRpcResponse::error(req.id, JsonRpcError::invalid_params("missing params")),
            Err(e) => return JsonRpcResponse::error(req.id, JsonRpcError::invalid_params(e.to_string())),
        };

        if params.name != "deepResearch" {
            return JsonRpcResponse::error(req.id, JsonRpcError::method_not_found(&params.name));
        }

        let result = match self.call_deep_research(&params.arguments).await {
            Ok(markdown) => CallToolResult::text(markdown),
            Err(message) => CallToolResult::error(message),
        };
        JsonRpcResponse::success(req.id, result)
    }

    async fn call_deep_research(&self, arguments: &serde_json::Value) -> std::result::Result<String, String> {
        let query = arguments.get("query").and_then(serde_json::Value::as_str).ok_or("query is required")?;
        let breadth = arguments.get("breadth").and_then(serde_json::Value::as_u64).map_or(self.config.default_breadth, |b| b as u8);
        let depth = arguments.get("depth").and_then(serde_json::Value::as_u64).map_or(self.config.default_depth, |d| d as u8);
        let model = arguments.get("model").and_then(serde_json::Value::as_str).map(str::to_string);
        let token_budget = arguments.get("tokenBudget").and_then(serde_json::Value::as_u64);
        let source_preferences = arguments.get("sourcePreferences").and_then(serde_json::Value::as_str).map(str::to_string);

        let request = TopicRequest::new(query, breadth, depth, model.clone(), token_budget, source_preferences)
            .map_err(|e| e.to_string())?;

        // Overwritten inside `scry_research::research` with a budget sized
        // from `request.token_budget`; this placeholder is never read.
        let placeholder_budget = scry_core::budget::BudgetAccountant::new(None);
        let deps = scry_research::Deps {
            gateway: &self.config.gateway,
            search: &self.config.search,
            fetcher: &self.config.fetcher,
            governor: &self.config.governor,
            budget: &placeholder_budget,
            model: model.as_deref(),
        };

        let result = scry_research::research(&deps, &request, Accumulators::default(), Vec::new()).await;
        Ok(result.report_markdown)
    }
}
