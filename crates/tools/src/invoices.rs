//! Invoice tools: `getInvoiceList` and `getInvoiceDetails`.

use std::sync::Arc;

use {
    async_trait::async_trait,
    bolmcp_mcp::{Result, ToolDescriptor, ToolHandler, ToolsCallResult},
    bolmcp_retailer::{InvoiceFormat, InvoiceRequestQuery, InvoiceState, RetailerClient},
    serde::Deserialize,
    serde_json::{Value, json},
};

use crate::content::{api_error, api_result, check_page, parse_arguments};

pub const GET_INVOICE_LIST: &str = "getInvoiceList";
pub const GET_INVOICE_DETAILS: &str = "getInvoiceDetails";

fn first_page() -> u32 {
    1
}

fn all_states() -> InvoiceState {
    InvoiceState::All
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct InvoiceListParams {
    #[serde(default = "first_page")]
    page: u32,
    #[serde(default)]
    shipment_id: Option<String>,
    #[serde(default = "all_states")]
    state: InvoiceState,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct InvoiceDetailsParams {
    invoice_id: String,
    #[serde(default = "first_page")]
    page: u32,
    #[serde(default)]
    format: InvoiceFormat,
}

pub struct GetInvoiceList {
    client: Arc<RetailerClient>,
}

#[async_trait]
impl ToolHandler for GetInvoiceList {
    async fn call(&self, arguments: Value) -> Result<ToolsCallResult> {
        let params: InvoiceListParams = match parse_arguments(GET_INVOICE_LIST, arguments) {
            Ok(params) => params,
            Err(invalid) => return Ok(invalid),
        };
        if let Err(invalid) = check_page(GET_INVOICE_LIST, Some(params.page)) {
            return Ok(invalid);
        }

        let query = InvoiceRequestQuery {
            page: Some(params.page),
            shipment_id: params.shipment_id.filter(|s| !s.trim().is_empty()),
            state: Some(params.state),
        };
        Ok(match self.client.list_invoice_requests(&query).await {
            Ok(response) => api_result(response, "bol://invoices"),
            Err(e) => api_error("listing invoice requests", &e),
        })
    }
}

pub struct GetInvoiceDetails {
    client: Arc<RetailerClient>,
}

#[async_trait]
impl ToolHandler for GetInvoiceDetails {
    async fn call(&self, arguments: Value) -> Result<ToolsCallResult> {
        let params: InvoiceDetailsParams = match parse_arguments(GET_INVOICE_DETAILS, arguments) {
            Ok(params) => params,
            Err(invalid) => return Ok(invalid),
        };
        if let Err(invalid) = check_page(GET_INVOICE_DETAILS, Some(params.page)) {
            return Ok(invalid);
        }

        let id = params.invoice_id.trim();
        let uri = match params.format {
            InvoiceFormat::Pdf => format!("bol://invoices/{id}.pdf"),
            InvoiceFormat::Html => format!("bol://invoices/{id}.html"),
            InvoiceFormat::Json => format!("bol://invoices/{id}"),
        };
        Ok(
            match self
                .client
                .get_invoice(id, Some(params.page), params.format)
                .await
            {
                Ok(response) => api_result(response, &uri),
                Err(e) => api_error(&format!("fetching invoice {id}"), &e),
            },
        )
    }
}

pub fn tools(client: &Arc<RetailerClient>) -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            GET_INVOICE_LIST,
            "Fetch a paginated list of invoice requests from bol.com.",
            json!({
                "type": "object",
                "properties": {
                    "page": {
                        "type": "integer",
                        "minimum": 1,
                        "default": 1,
                        "description": "Page number to fetch (>= 1). Defaults to 1."
                    },
                    "shipmentId": {
                        "type": "string",
                        "description": "Only return invoice requests for this shipment id."
                    },
                    "state": {
                        "type": "string",
                        "enum": InvoiceState::ALL_VALUES,
                        "default": "ALL",
                        "description": "Filter by invoice request state. Defaults to ALL."
                    }
                },
                "additionalProperties": false
            }),
            Arc::new(GetInvoiceList {
                client: Arc::clone(client),
            }),
        ),
        ToolDescriptor::new(
            GET_INVOICE_DETAILS,
            "Fetch the specification of a single bol.com invoice as JSON, PDF or HTML.",
            json!({
                "type": "object",
                "properties": {
                    "invoiceId": {
                        "type": "string",
                        "description": "Id of the invoice to fetch."
                    },
                    "page": {
                        "type": "integer",
                        "minimum": 1,
                        "default": 1,
                        "description": "Page of the invoice's transaction list (>= 1)."
                    },
                    "format": {
                        "type": "string",
                        "enum": ["json", "pdf", "html"],
                        "default": "json",
                        "description": "Representation to return. PDF comes back as an embedded resource."
                    }
                },
                "required": ["invoiceId"],
                "additionalProperties": false
            }),
            Arc::new(GetInvoiceDetails {
                client: Arc::clone(client),
            }),
        ),
    ]
}
