//! Tool descriptors as supplied by tool sources, and their validated form.

use std::sync::Arc;

use {async_trait::async_trait, serde_json::Value};

use crate::{
    error::Result,
    registry::RejectReason,
    types::{McpToolDef, ToolsCallResult},
};

/// Executes one tool.
///
/// Business failures should come back as an `is_error` result; an `Err` is
/// turned into one by the router.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, arguments: Value) -> Result<ToolsCallResult>;
}

/// A tool as a source hands it over, before validation.
#[derive(Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Option<Value>,
    pub handler: Option<Arc<dyn ToolHandler>>,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: Some(input_schema),
            handler: Some(handler),
        }
    }

    /// Check the descriptor once, producing the form the host accepts.
    pub fn validate(self) -> std::result::Result<RegisteredTool, RejectReason> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(RejectReason::MissingName);
        }
        let input_schema = self.input_schema.ok_or(RejectReason::MissingSchema)?;
        match input_schema.get("type").and_then(Value::as_str) {
            Some("object") if input_schema.is_object() => {},
            _ => return Err(RejectReason::InvalidSchema),
        }
        let handler = self.handler.ok_or(RejectReason::MissingHandler)?;

        Ok(RegisteredTool {
            name: name.to_string(),
            description: self.description,
            input_schema,
            handler,
        })
    }
}

impl std::fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("has_schema", &self.input_schema.is_some())
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

/// A validated tool: non-empty name, object schema, callable handler.
#[derive(Clone)]
pub struct RegisteredTool {
    name: String,
    description: String,
    input_schema: Value,
    handler: Arc<dyn ToolHandler>,
}

impl RegisteredTool {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn definition(&self) -> McpToolDef {
        McpToolDef {
            name: self.name.clone(),
            description: (!self.description.is_empty()).then(|| self.description.clone()),
            input_schema: self.input_schema.clone(),
        }
    }

    pub fn handler(&self) -> Arc<dyn ToolHandler> {
        Arc::clone(&self.handler)
    }
}

impl std::fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A named list of tools, e.g. all order tools.
#[derive(Debug, Clone)]
pub struct ToolSource {
    pub name: String,
    pub tools: Vec<ToolDescriptor>,
}

impl ToolSource {
    pub fn new(name: impl Into<String>, tools: Vec<ToolDescriptor>) -> Self {
        Self {
            name: name.into(),
            tools,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    struct Noop;

    #[async_trait]
    impl ToolHandler for Noop {
        async fn call(&self, _arguments: Value) -> Result<ToolsCallResult> {
            Ok(ToolsCallResult::text("ok"))
        }
    }

    fn valid() -> ToolDescriptor {
        ToolDescriptor::new(
            "getSingleOrder",
            "Fetch one order",
            json!({"type": "object", "properties": {}}),
            Arc::new(Noop),
        )
    }

    #[test]
    fn valid_descriptor_passes() {
        let tool = valid().validate().unwrap();
        assert_eq!(tool.name(), "getSingleOrder");
        assert_eq!(
            tool.definition().description.as_deref(),
            Some("Fetch one order")
        );
    }

    #[test]
    fn each_defect_has_its_reason() {
        let mut d = valid();
        d.name = "  ".into();
        assert_eq!(d.validate().unwrap_err(), RejectReason::MissingName);

        let mut d = valid();
        d.input_schema = None;
        assert_eq!(d.validate().unwrap_err(), RejectReason::MissingSchema);

        let mut d = valid();
        d.input_schema = Some(json!({"type": "string"}));
        assert_eq!(d.validate().unwrap_err(), RejectReason::InvalidSchema);

        let mut d = valid();
        d.input_schema = Some(json!([]));
        assert_eq!(d.validate().unwrap_err(), RejectReason::InvalidSchema);

        let mut d = valid();
        d.handler = None;
        assert_eq!(d.validate().unwrap_err(), RejectReason::MissingHandler);
    }

    #[tokio::test]
    async fn handler_is_callable_after_validation() {
        let tool = valid().validate().unwrap();
        let result = tool.handler().call(json!({})).await.unwrap();
        assert_eq!(result.joined_text(), "ok");
    }
}
