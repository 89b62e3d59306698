#![allow(clippy::unwrap_used, clippy::expect_used)]
use std::sync::Arc;

use {
    async_trait::async_trait,
    bolmcp_mcp::{
        CapabilityRegistry, InitOutcome, McpServer, RejectReason, ServerInfo, ToolDescriptor,
        ToolHandler, ToolRouter, ToolSource, ToolsCallResult,
    },
    serde_json::{Value, json},
};

struct Named(&'static str);

#[async_trait]
impl ToolHandler for Named {
    async fn call(&self, _arguments: Value) -> bolmcp_mcp::Result<ToolsCallResult> {
        Ok(ToolsCallResult::text(self.0))
    }
}

fn tool(name: &str, marker: &'static str) -> ToolDescriptor {
    ToolDescriptor::new(
        name,
        format!("{name} tool"),
        json!({"type": "object", "properties": {}}),
        Arc::new(Named(marker)),
    )
}

fn server(router: Arc<ToolRouter>) -> McpServer {
    McpServer::new(router, ServerInfo {
        name: "bol-mcp".into(),
        version: "test".into(),
    })
}

#[tokio::test]
async fn overlapping_sources_expose_first_definition() {
    let registry = CapabilityRegistry::new(vec![
        ToolSource::new("invoices", vec![tool("getInvoiceList", "invoices")]),
        ToolSource::new("orders", vec![
            tool("getOrdersList", "orders"),
            tool("getInvoiceList", "shadowed"),
        ]),
    ]);
    let router = Arc::new(ToolRouter::new());

    let InitOutcome::Initialized(report) = registry.initialize_once(router.as_ref()) else {
        panic!("first call must register");
    };
    assert_eq!(report.duplicates, vec!["getInvoiceList"]);
    assert_eq!(router.names(), vec!["getInvoiceList", "getOrdersList"]);

    let result = router
        .call_tool("getInvoiceList", json!({}))
        .await
        .unwrap();
    assert_eq!(result.joined_text(), "invoices");
}

#[tokio::test]
async fn reinitialization_keeps_tool_list_stable() {
    let registry = CapabilityRegistry::new(vec![ToolSource::new("orders", vec![
        tool("getOrdersList", "a"),
        tool("getSingleOrder", "b"),
    ])]);
    let router = Arc::new(ToolRouter::new());

    let outcomes: Vec<_> = initialize_repeatedly(&registry, &router);
    assert_eq!(
        outcomes
            .iter()
            .filter(|o| matches!(o, InitOutcome::Initialized(_)))
            .count(),
        1
    );

    let resp = server(router)
        .handle_raw(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#, "test")
        .await
        .unwrap();
    let tools = resp.result.unwrap()["tools"].as_array().unwrap().len();
    assert_eq!(tools, 2);
}

fn initialize_repeatedly(registry: &CapabilityRegistry, router: &Arc<ToolRouter>) -> Vec<InitOutcome> {
    (0..3)
        .map(|_| registry.initialize_once(router.as_ref()))
        .collect()
}

#[tokio::test]
async fn malformed_descriptor_is_reported_not_fatal() {
    let mut no_schema = tool("getCommissionSingle", "x");
    no_schema.input_schema = None;
    let registry = CapabilityRegistry::new(vec![ToolSource::new("commissions", vec![
        no_schema,
        tool("getCommissionsBulk", "bulk"),
    ])]);
    let router = Arc::new(ToolRouter::new());

    let InitOutcome::Initialized(report) = registry.initialize_once(router.as_ref()) else {
        panic!("first call must register");
    };
    assert_eq!(report.rejected, vec![(
        "getCommissionSingle".to_string(),
        RejectReason::MissingSchema
    )]);
    assert_eq!(router.names(), vec!["getCommissionsBulk"]);

    let resp = server(router)
        .handle_raw(
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"getCommissionSingle"}}"#,
            "test",
        )
        .await
        .unwrap();
    assert_eq!(resp.error.unwrap().code, -32602);
}
