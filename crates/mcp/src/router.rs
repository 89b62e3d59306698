use std::{sync::RwLock, time::Instant};

use {
    serde_json::Value,
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use bolmcp_metrics::{counter, histogram, labels, mcp as mcp_metrics};

use crate::{
    error::{Error, Result},
    registry::{RegistrationError, ToolHost},
    tool::RegisteredTool,
    types::{McpToolDef, ToolsCallResult},
};

/// The hosting side of the registry: keeps registered tools in order and
/// executes `tools/call`.
#[derive(Debug, Default)]
pub struct ToolRouter {
    tools: RwLock<Vec<RegisteredTool>>,
}

impl ToolRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tool definitions in registration order.
    pub fn list(&self) -> Vec<McpToolDef> {
        self.tools
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(RegisteredTool::definition)
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|t| t.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run a tool. Only an unknown name is an `Err`; handler failures come
    /// back as an `is_error` result.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolsCallResult> {
        let handler = self
            .tools
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|t| t.name() == name)
            .map(RegisteredTool::handler)
            .ok_or_else(|| Error::UnknownTool(name.to_string()))?;

        #[cfg(feature = "metrics")]
        counter!(mcp_metrics::TOOL_CALLS_TOTAL, labels::TOOL => name.to_string()).increment(1);

        let started = Instant::now();
        let result = match handler.call(arguments).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = %name, error = %e, "tool handler failed");
                ToolsCallResult::error(format!("{name} failed: {e}"))
            },
        };

        #[cfg(feature = "metrics")]
        {
            histogram!(mcp_metrics::TOOL_CALL_DURATION_SECONDS, labels::TOOL => name.to_string())
                .record(started.elapsed().as_secs_f64());
            if result.is_error {
                counter!(mcp_metrics::TOOL_CALL_ERRORS_TOTAL, labels::TOOL => name.to_string())
                    .increment(1);
            }
        }

        debug!(
            tool = %name,
            is_error = result.is_error,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "tool call finished"
        );
        Ok(result)
    }
}

impl ToolHost for ToolRouter {
    fn register(&self, tool: RegisteredTool) -> std::result::Result<(), RegistrationError> {
        let mut tools = self.tools.write().unwrap_or_else(|e| e.into_inner());
        if tools.iter().any(|t| t.name() == tool.name()) {
            return Err(RegistrationError::Duplicate(tool.name().to_string()));
        }
        info!(tool = %tool.name(), "tool available");
        tools.push(tool);
        Ok(())
    }
}
