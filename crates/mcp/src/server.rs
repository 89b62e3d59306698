//! JSON-RPC method dispatch for the MCP server.

use std::sync::Arc;

use {
    serde_json::{Value, json},
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use bolmcp_metrics::{counter, labels, mcp as mcp_metrics};

use crate::{
    error::Error,
    router::ToolRouter,
    types::{
        INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, InitializeParams, InitializeResult,
        JsonRpcError, JsonRpcMessage, JsonRpcResponse, METHOD_NOT_FOUND, PARSE_ERROR,
        PROTOCOL_VERSION, SUPPORTED_PROTOCOL_VERSIONS, ServerCapabilities, ServerInfo,
        ToolsCallParams, ToolsCapability, ToolsListResult,
    },
};

/// Answers MCP requests from any transport.
#[derive(Debug, Clone)]
pub struct McpServer {
    router: Arc<ToolRouter>,
    info: ServerInfo,
    instructions: Option<String>,
}

impl McpServer {
    pub fn new(router: Arc<ToolRouter>, info: ServerInfo) -> Self {
        Self {
            router,
            info,
            instructions: None,
        }
    }

    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn router(&self) -> &Arc<ToolRouter> {
        &self.router
    }

    /// Handle one raw message. `None` means nothing should be sent back
    /// (a notification).
    pub async fn handle_raw(&self, raw: &str, transport: &'static str) -> Option<JsonRpcResponse> {
        #[cfg(feature = "metrics")]
        counter!(mcp_metrics::RPC_MESSAGES_TOTAL, labels::TRANSPORT => transport).increment(1);

        match serde_json::from_str::<Value>(raw) {
            Ok(value) => self.handle_value(value, transport).await,
            Err(e) => {
                warn!(transport, error = %e, "unparsable JSON-RPC message");
                Some(JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::new(PARSE_ERROR, format!("parse error: {e}")),
                ))
            },
        }
    }

    /// Handle one already-parsed message.
    pub async fn handle_value(&self, value: Value, transport: &'static str) -> Option<JsonRpcResponse> {
        let message: JsonRpcMessage = match serde_json::from_value(value) {
            Ok(message) => message,
            Err(e) => {
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::new(INVALID_REQUEST, format!("invalid request: {e}")),
                ));
            },
        };

        let Some(method) = message.method else {
            // A response or garbage; we never send requests, so nothing to match.
            return message.id.map(|id| {
                JsonRpcResponse::failure(id, JsonRpcError::new(INVALID_REQUEST, "missing method"))
            });
        };

        let Some(id) = message.id else {
            debug!(transport, method = %method, "notification received");
            return None;
        };

        if message.jsonrpc.as_deref() != Some("2.0") {
            return Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::new(INVALID_REQUEST, "jsonrpc must be \"2.0\""),
            ));
        }

        debug!(transport, method = %method, id = %id, "request received");
        Some(match self.dispatch(&method, message.params).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }

    async fn dispatch(&self, method: &str, params: Option<Value>) -> Result<Value, JsonRpcError> {
        match method {
            "initialize" => self.initialize(params),
            "ping" => Ok(json!({})),
            "tools/list" => to_value(ToolsListResult {
                tools: self.router.list(),
            }),
            "tools/call" => self.call_tool(params).await,
            other => Err(JsonRpcError::new(
                METHOD_NOT_FOUND,
                format!("method not found: {other}"),
            )),
        }
    }

    fn initialize(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: InitializeParams = match params {
            Some(params) => serde_json::from_value(params)
                .map_err(|e| JsonRpcError::new(INVALID_PARAMS, format!("invalid params: {e}")))?,
            None => InitializeParams::default(),
        };

        let protocol_version = params
            .protocol_version
            .as_deref()
            .filter(|v| SUPPORTED_PROTOCOL_VERSIONS.contains(v))
            .unwrap_or(PROTOCOL_VERSION)
            .to_string();

        info!(
            client = params.client_info.as_ref().map_or("unknown", |c| c.name.as_str()),
            requested = ?params.protocol_version,
            protocol_version = %protocol_version,
            "client initialized session"
        );

        to_value(InitializeResult {
            protocol_version,
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
            },
            server_info: self.info.clone(),
            instructions: self.instructions.clone(),
        })
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: ToolsCallParams = params
            .ok_or_else(|| JsonRpcError::new(INVALID_PARAMS, "tools/call requires params"))
            .and_then(|p| {
                serde_json::from_value(p)
                    .map_err(|e| JsonRpcError::new(INVALID_PARAMS, format!("invalid params: {e}")))
            })?;

        match self.router.call_tool(&params.name, params.arguments).await {
            Ok(result) => to_value(result),
            Err(Error::UnknownTool(name)) => Err(JsonRpcError::new(
                INVALID_PARAMS,
                format!("unknown tool: {name}"),
            )),
            Err(e) => Err(JsonRpcError::new(INTERNAL_ERROR, e.to_string())),
        }
    }
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::new(INTERNAL_ERROR, e.to_string()))
}
