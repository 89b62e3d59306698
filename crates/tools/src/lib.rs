//! bol.com Retailer tools exposed over MCP.
//!
//! Each module contributes one [`ToolSource`]; [`all_sources`] returns them in
//! registration order.

use std::sync::Arc;

use {bolmcp_mcp::ToolSource, bolmcp_retailer::RetailerClient};

pub mod commissions;
pub mod content;
pub mod invoices;
pub mod orders;

/// Invoices, then commissions, then orders.
pub fn all_sources(client: Arc<RetailerClient>) -> Vec<ToolSource> {
    vec![
        ToolSource::new("invoices", invoices::tools(&client)),
        ToolSource::new("commissions", commissions::tools(&client)),
        ToolSource::new("orders", orders::tools(&client)),
    ]
}
