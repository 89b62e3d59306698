//! Commission tools: `getCommissionSingle` and `getCommissionsBulk`.

use std::sync::Arc;

use {
    async_trait::async_trait,
    bolmcp_mcp::{Result, ToolDescriptor, ToolHandler, ToolsCallResult},
    bolmcp_retailer::{
        CommissionProduct, Condition, MAX_BULK_COMMISSION_PRODUCTS, RetailerClient,
    },
    serde::Deserialize,
    serde_json::{Value, json},
};

use crate::content::{api_error, api_result, parse_arguments};

pub const GET_COMMISSION_SINGLE: &str = "getCommissionSingle";
pub const GET_COMMISSIONS_BULK: &str = "getCommissionsBulk";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CommissionSingleParams {
    ean: String,
    unit_price: f64,
    #[serde(default)]
    condition: Condition,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CommissionsBulkParams {
    products: Vec<CommissionProduct>,
}

fn check_product(
    tool: &str,
    ean: &str,
    unit_price: f64,
) -> std::result::Result<(), ToolsCallResult> {
    if ean.trim().is_empty() {
        return Err(ToolsCallResult::error(format!(
            "Invalid arguments for {tool}: ean must not be empty"
        )));
    }
    if !unit_price.is_finite() || unit_price <= 0.0 {
        return Err(ToolsCallResult::error(format!(
            "Invalid arguments for {tool}: unitPrice must be positive (EAN {ean})"
        )));
    }
    Ok(())
}

fn condition_schema() -> Value {
    json!({
        "type": "string",
        "enum": Condition::ALL_VALUES,
        "default": "NEW",
        "description": "Product condition. Defaults to NEW."
    })
}

pub struct GetCommissionSingle {
    client: Arc<RetailerClient>,
}

#[async_trait]
impl ToolHandler for GetCommissionSingle {
    async fn call(&self, arguments: Value) -> Result<ToolsCallResult> {
        let params: CommissionSingleParams =
            match parse_arguments(GET_COMMISSION_SINGLE, arguments) {
                Ok(params) => params,
                Err(invalid) => return Ok(invalid),
            };
        if let Err(invalid) = check_product(GET_COMMISSION_SINGLE, &params.ean, params.unit_price)
        {
            return Ok(invalid);
        }

        let ean = params.ean.trim();
        Ok(
            match self
                .client
                .get_commission(ean, params.unit_price, params.condition)
                .await
            {
                Ok(response) => api_result(response, &format!("bol://commission/{ean}")),
                Err(e) => api_error(&format!("fetching commission for EAN {ean}"), &e),
            },
        )
    }
}

pub struct GetCommissionsBulk {
    client: Arc<RetailerClient>,
}

#[async_trait]
impl ToolHandler for GetCommissionsBulk {
    async fn call(&self, arguments: Value) -> Result<ToolsCallResult> {
        let params: CommissionsBulkParams = match parse_arguments(GET_COMMISSIONS_BULK, arguments)
        {
            Ok(params) => params,
            Err(invalid) => return Ok(invalid),
        };
        for product in &params.products {
            if let Err(invalid) =
                check_product(GET_COMMISSIONS_BULK, &product.ean, product.unit_price)
            {
                return Ok(invalid);
            }
        }

        Ok(
            match self.client.get_commissions_bulk(&params.products).await {
                Ok(response) => api_result(response, "bol://commission"),
                Err(e) => api_error(
                    &format!("fetching commissions for {} products", params.products.len()),
                    &e,
                ),
            },
        )
    }
}

pub fn tools(client: &Arc<RetailerClient>) -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            GET_COMMISSION_SINGLE,
            "Fetch commission and reduction details for a single product by EAN, unit price and condition.",
            json!({
                "type": "object",
                "properties": {
                    "ean": {
                        "type": "string",
                        "description": "EAN of the product."
                    },
                    "unitPrice": {
                        "type": "number",
                        "exclusiveMinimum": 0,
                        "description": "Selling price per unit in euros."
                    },
                    "condition": condition_schema()
                },
                "required": ["ean", "unitPrice"],
                "additionalProperties": false
            }),
            Arc::new(GetCommissionSingle {
                client: Arc::clone(client),
            }),
        ),
        ToolDescriptor::new(
            GET_COMMISSIONS_BULK,
            "Fetch commission and reduction details for up to 100 products in one request.",
            json!({
                "type": "object",
                "properties": {
                    "products": {
                        "type": "array",
                        "minItems": 1,
                        "maxItems": MAX_BULK_COMMISSION_PRODUCTS,
                        "items": {
                            "type": "object",
                            "properties": {
                                "ean": {
                                    "type": "string",
                                    "description": "EAN of the product."
                                },
                                "unitPrice": {
                                    "type": "number",
                                    "exclusiveMinimum": 0,
                                    "description": "Selling price per unit in euros."
                                },
                                "condition": condition_schema()
                            },
                            "required": ["ean", "unitPrice"]
                        }
                    }
                },
                "required": ["products"],
                "additionalProperties": false
            }),
            Arc::new(GetCommissionsBulk {
                client: Arc::clone(client),
            }),
        ),
    ]
}
