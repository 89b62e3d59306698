//! Order tools: `getOrdersList` and `getSingleOrder`.

use std::sync::Arc;

use {
    async_trait::async_trait,
    bolmcp_mcp::{Result, ToolDescriptor, ToolHandler, ToolsCallResult},
    bolmcp_retailer::{ApiResponse, FulfilmentMethod, OrderQuery, OrderStatus, RetailerClient},
    serde::Deserialize,
    serde_json::{Value, json},
};

use crate::content::{api_error, api_result, check_page, parse_arguments};

pub const GET_ORDERS_LIST: &str = "getOrdersList";
pub const GET_SINGLE_ORDER: &str = "getSingleOrder";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct OrdersListParams {
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    fulfilment_method: Option<FulfilmentMethod>,
    #[serde(default)]
    status: Option<OrderStatus>,
    #[serde(default)]
    latest_change_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SingleOrderParams {
    order_id: String,
}

/// `YYYY-MM-DD`, digits only; the API validates the calendar date itself.
fn is_iso_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// The list endpoint wraps orders in `{"orders": [...]}`; callers only want
/// the list.
fn unwrap_orders(response: ApiResponse) -> ApiResponse {
    match response {
        ApiResponse::Json(Value::Object(mut body)) => match body.remove("orders") {
            Some(orders) => ApiResponse::Json(orders),
            None => ApiResponse::Json(Value::Object(body)),
        },
        other => other,
    }
}

pub struct GetOrdersList {
    client: Arc<RetailerClient>,
}

#[async_trait]
impl ToolHandler for GetOrdersList {
    async fn call(&self, arguments: Value) -> Result<ToolsCallResult> {
        let params: OrdersListParams = match parse_arguments(GET_ORDERS_LIST, arguments) {
            Ok(params) => params,
            Err(invalid) => return Ok(invalid),
        };
        if let Err(invalid) = check_page(GET_ORDERS_LIST, params.page) {
            return Ok(invalid);
        }
        if let Some(date) = &params.latest_change_date
            && !is_iso_date(date)
        {
            return Ok(ToolsCallResult::error(format!(
                "Invalid arguments for {GET_ORDERS_LIST}: latestChangeDate must be YYYY-MM-DD, got {date}"
            )));
        }

        let query = OrderQuery {
            page: params.page,
            fulfilment_method: params.fulfilment_method,
            status: params.status,
            latest_change_date: params.latest_change_date,
        };
        Ok(match self.client.list_orders(&query).await {
            Ok(response) => api_result(unwrap_orders(response), "bol://orders"),
            Err(e) => api_error("listing orders", &e),
        })
    }
}

pub struct GetSingleOrder {
    client: Arc<RetailerClient>,
}

#[async_trait]
impl ToolHandler for GetSingleOrder {
    async fn call(&self, arguments: Value) -> Result<ToolsCallResult> {
        let params: SingleOrderParams = match parse_arguments(GET_SINGLE_ORDER, arguments) {
            Ok(params) => params,
            Err(invalid) => return Ok(invalid),
        };
        let id = params.order_id.trim();
        Ok(match self.client.get_order(id).await {
            Ok(response) => api_result(response, &format!("bol://orders/{id}")),
            Err(e) => api_error(&format!("fetching order {id}"), &e),
        })
    }
}

pub fn tools(client: &Arc<RetailerClient>) -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            GET_ORDERS_LIST,
            "Fetch a paginated list of bol.com orders, optionally filtered by fulfilment method, status and last change date.",
            json!({
                "type": "object",
                "properties": {
                    "page": {
                        "type": "integer",
                        "minimum": 1,
                        "description": "Page number to fetch (>= 1)."
                    },
                    "fulfilmentMethod": {
                        "type": "string",
                        "enum": FulfilmentMethod::ALL_VALUES,
                        "description": "FBR (fulfilled by retailer), FBB (fulfilled by bol.com) or ALL."
                    },
                    "status": {
                        "type": "string",
                        "enum": OrderStatus::ALL_VALUES,
                        "description": "Order status filter."
                    },
                    "latestChangeDate": {
                        "type": "string",
                        "pattern": "^\\d{4}-\\d{2}-\\d{2}$",
                        "description": "Only orders changed on this date (YYYY-MM-DD)."
                    }
                },
                "additionalProperties": false
            }),
            Arc::new(GetOrdersList {
                client: Arc::clone(client),
            }),
        ),
        ToolDescriptor::new(
            GET_SINGLE_ORDER,
            "Fetch the details of a single bol.com order.",
            json!({
                "type": "object",
                "properties": {
                    "orderId": {
                        "type": "string",
                        "description": "Id of the order to fetch."
                    }
                },
                "required": ["orderId"],
                "additionalProperties": false
            }),
            Arc::new(GetSingleOrder {
                client: Arc::clone(client),
            }),
        ),
    ]
}
