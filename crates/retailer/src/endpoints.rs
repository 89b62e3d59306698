//! Typed wrappers over [`RetailerClient::call`] for the endpoints the tools use.

use {reqwest::Method, serde_json::json, tracing::debug};

use crate::{
    client::RetailerClient,
    error::{Error, Result},
    request::{ApiResponse, RequestOptions},
    types::{
        CommissionProduct, Condition, FulfilmentMethod, InvoiceFormat, InvoiceState, OrderStatus,
    },
};

/// Bulk commission requests accept at most this many products.
pub const MAX_BULK_COMMISSION_PRODUCTS: usize = 100;

/// Filters for `GET /orders`.
#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    pub page: Option<u32>,
    pub fulfilment_method: Option<FulfilmentMethod>,
    pub status: Option<OrderStatus>,
    /// `YYYY-MM-DD`
    pub latest_change_date: Option<String>,
}

/// Filters for `GET /invoices`.
#[derive(Debug, Clone, Default)]
pub struct InvoiceRequestQuery {
    pub page: Option<u32>,
    pub shipment_id: Option<String>,
    pub state: Option<InvoiceState>,
}

/// Round to whole cents.
#[must_use]
pub fn round_to_cents(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}

fn path_segment(kind: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::InvalidArgument(format!("{kind} must not be empty")));
    }
    if value.contains(['/', '?', '#']) {
        return Err(Error::InvalidArgument(format!(
            "{kind} contains reserved characters: {value}"
        )));
    }
    Ok(value.to_string())
}

impl RetailerClient {
    pub async fn list_orders(&self, query: &OrderQuery) -> Result<ApiResponse> {
        let options = RequestOptions::new()
            .query_opt("page", query.page)
            .query_opt("fulfilment-method", query.fulfilment_method)
            .query_opt("status", query.status)
            .query_opt("latest-change-date", query.latest_change_date.as_deref());
        self.call("/orders", Method::GET, options).await
    }

    pub async fn get_order(&self, order_id: &str) -> Result<ApiResponse> {
        let order_id = path_segment("order id", order_id)?;
        self.call(&format!("/orders/{order_id}"), Method::GET, RequestOptions::new())
            .await
    }

    pub async fn list_invoice_requests(&self, query: &InvoiceRequestQuery) -> Result<ApiResponse> {
        let options = RequestOptions::new()
            .query_opt("page", query.page)
            .query_opt("shipment-id", query.shipment_id.as_deref())
            .query_opt("state", query.state);
        self.call("/invoices", Method::GET, options).await
    }

    /// Fetch one invoice; `format` selects the `Accept` header.
    pub async fn get_invoice(
        &self,
        invoice_id: &str,
        page: Option<u32>,
        format: InvoiceFormat,
    ) -> Result<ApiResponse> {
        let invoice_id = path_segment("invoice id", invoice_id)?;
        let options = RequestOptions::new()
            .query_opt("page", page)
            .header("Accept", format.accept());
        self.call(&format!("/invoices/{invoice_id}"), Method::GET, options)
            .await
    }

    pub async fn get_commission(
        &self,
        ean: &str,
        unit_price: f64,
        condition: Condition,
    ) -> Result<ApiResponse> {
        let ean = path_segment("ean", ean)?;
        if !unit_price.is_finite() || unit_price <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "unit price must be positive, got {unit_price}"
            )));
        }
        let options = RequestOptions::new()
            .query("unit-price", format!("{:.2}", round_to_cents(unit_price)))
            .query("condition", condition);
        self.call(&format!("/commission/{ean}"), Method::GET, options)
            .await
    }

    /// Commission for 1 to [`MAX_BULK_COMMISSION_PRODUCTS`] products in one request.
    pub async fn get_commissions_bulk(&self, products: &[CommissionProduct]) -> Result<ApiResponse> {
        if products.is_empty() || products.len() > MAX_BULK_COMMISSION_PRODUCTS {
            return Err(Error::InvalidArgument(format!(
                "bulk commission requests take 1 to {MAX_BULK_COMMISSION_PRODUCTS} products, got {}",
                products.len()
            )));
        }

        let queries: Vec<_> = products
            .iter()
            .map(|p| {
                json!({
                    "ean": p.ean,
                    "unitPrice": round_to_cents(p.unit_price),
                    "condition": p.condition,
                })
            })
            .collect();
        debug!(count = queries.len(), "requesting bulk commissions");

        let options = RequestOptions::new()
            .json_body(json!({ "commissionQueries": queries }))
            .content_type(crate::media::RETAILER_JSON);
        self.call("/commission", Method::POST, options).await
    }
}
