//! bol.com Retailer API client.
//!
//! [`RetailerClient::call`] is the generic authenticated dispatcher; the
//! endpoint methods in [`endpoints`] build typed queries on top of it.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod media;
pub mod request;
pub mod types;

pub use {
    client::RetailerClient,
    endpoints::{InvoiceRequestQuery, MAX_BULK_COMMISSION_PRODUCTS, OrderQuery, round_to_cents},
    error::{Error, Result},
    request::{ApiResponse, RequestOptions},
    types::{
        CommissionProduct, Condition, FulfilmentMethod, InvoiceFormat, InvoiceState, OrderStatus,
    },
};
