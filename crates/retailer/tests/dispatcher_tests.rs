#![allow(clippy::unwrap_used, clippy::expect_used)]
use std::{
    io::Write,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use {
    async_trait::async_trait,
    bolmcp_oauth::AccessTokenProvider,
    bolmcp_retailer::{
        ApiResponse, CommissionProduct, Condition, Error, FulfilmentMethod, InvoiceFormat,
        OrderQuery, OrderStatus, RequestOptions, RetailerClient,
    },
    mockito::{Matcher, Server},
    reqwest::Method,
    secrecy::Secret,
    serde_json::json,
};

/// Hands out a fixed token and counts how often it was asked.
#[derive(Default)]
struct StaticToken {
    calls: AtomicUsize,
}

#[async_trait]
impl AccessTokenProvider for StaticToken {
    async fn access_token(&self) -> bolmcp_oauth::Result<Secret<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Secret::new("test-token".into()))
    }
}

struct RejectedCredentials;

#[async_trait]
impl AccessTokenProvider for RejectedCredentials {
    async fn access_token(&self) -> bolmcp_oauth::Result<Secret<String>> {
        Err(bolmcp_oauth::Error::TokenEndpoint {
            status: 401,
            body: "invalid_client".into(),
        })
    }
}

fn client(server: &Server) -> RetailerClient {
    RetailerClient::new(
        &server.url(),
        Duration::from_secs(5),
        Arc::new(StaticToken::default()),
    )
    .unwrap()
}

#[tokio::test]
async fn json_response_with_default_headers() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/orders/1043946570")
        .match_header("authorization", "Bearer test-token")
        .match_header("accept", "application/vnd.retailer.v10+json")
        .with_status(200)
        .with_header("content-type", "application/vnd.retailer.v10+json;charset=UTF-8")
        .with_body(r#"{"orderId":"1043946570"}"#)
        .create_async()
        .await;

    let resp = client(&server).get_order("1043946570").await.unwrap();
    assert_eq!(resp, ApiResponse::Json(json!({"orderId": "1043946570"})));
    mock.assert_async().await;
}

#[tokio::test]
async fn no_content_is_empty() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/orders/1")
        .with_status(204)
        .create_async()
        .await;

    let resp = client(&server).get_order("1").await.unwrap();
    assert!(resp.is_empty());
}

#[tokio::test]
async fn pdf_invoice_is_binary() {
    let mut server = Server::new_async().await;
    let pdf = b"%PDF-1.4 fake".to_vec();
    let mock = server
        .mock("GET", "/invoices/INV-1")
        .match_header("accept", "application/vnd.retailer.v10+pdf")
        .with_status(200)
        .with_header("content-type", "application/vnd.retailer.v10+pdf")
        .with_body(pdf.clone())
        .create_async()
        .await;

    let resp = client(&server)
        .get_invoice("INV-1", None, InvoiceFormat::Pdf)
        .await
        .unwrap();
    match resp {
        ApiResponse::Binary {
            content_type,
            bytes,
        } => {
            assert_eq!(content_type, "application/vnd.retailer.v10+pdf");
            assert_eq!(bytes.as_ref(), pdf.as_slice());
        },
        other => panic!("expected binary, got {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn unexpected_content_type_is_text() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/invoices/INV-2")
        .match_query(Matcher::UrlEncoded("page".into(), "3".into()))
        .match_header("accept", "text/html")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body("<h1>invoice</h1>")
        .create_async()
        .await;

    let resp = client(&server)
        .get_invoice("INV-2", Some(3), InvoiceFormat::Html)
        .await
        .unwrap();
    assert_eq!(resp, ApiResponse::Text {
        content_type: "text/html".into(),
        text: "<h1>invoice</h1>".into(),
    });
}

#[tokio::test]
async fn non_success_status_is_api_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/orders/404")
        .with_status(404)
        .with_body(r#"{"title":"Not Found"}"#)
        .create_async()
        .await;

    let err = client(&server).get_order("404").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    match err {
        Error::Api { body, .. } => assert!(body.contains("Not Found")),
        other => panic!("expected api error, got {other:?}"),
    }
}

fn impatient_client(server: &Server) -> RetailerClient {
    RetailerClient::new(
        &server.url(),
        Duration::from_millis(50),
        Arc::new(StaticToken::default()),
    )
    .unwrap()
}

#[tokio::test]
async fn slow_response_times_out() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/orders/1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_chunked_body(|w| {
            std::thread::sleep(Duration::from_millis(500));
            w.write_all(br#"{"orderId":"1"}"#)
        })
        .create_async()
        .await;

    let err = impatient_client(&server).get_order("1").await.unwrap_err();
    assert!(matches!(err, Error::Network(_)), "{err:?}");
    assert!(err.is_timeout());
    assert_eq!(err.kind(), "network");
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn unreadable_error_body_keeps_status() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/orders/2")
        .with_status(502)
        .with_chunked_body(|w| {
            std::thread::sleep(Duration::from_millis(500));
            w.write_all(b"bad gateway")
        })
        .create_async()
        .await;

    let err = impatient_client(&server).get_order("2").await.unwrap_err();
    assert_eq!(err.status(), Some(502));
    match err {
        Error::Api { body, .. } => assert!(body.is_empty()),
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn auth_failure_never_reaches_the_api() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = RetailerClient::new(
        &server.url(),
        Duration::from_secs(5),
        Arc::new(RejectedCredentials),
    )
    .unwrap();
    let err = client.get_order("1").await.unwrap_err();

    assert!(matches!(err, Error::Auth(_)));
    assert_eq!(err.status(), Some(401));
    mock.assert_async().await;
}

#[tokio::test]
async fn order_filters_keep_query_order() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/orders")
        .match_query(Matcher::Exact(
            "page=2&fulfilment-method=FBB&status=OPEN&latest-change-date=2024-05-01".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"orders":[]}"#)
        .create_async()
        .await;

    let query = OrderQuery {
        page: Some(2),
        fulfilment_method: Some(FulfilmentMethod::Fbb),
        status: Some(OrderStatus::Open),
        latest_change_date: Some("2024-05-01".into()),
    };
    client(&server).list_orders(&query).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn caller_accept_overrides_default() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/orders")
        .match_header("accept", "application/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{}")
        .create_async()
        .await;

    client(&server)
        .call(
            "/orders",
            Method::GET,
            RequestOptions::new().header("Accept", "application/json"),
        )
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn get_with_body_sends_no_content_type() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/orders")
        .match_header("content-type", Matcher::Missing)
        .match_body("")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{}")
        .create_async()
        .await;

    client(&server)
        .call(
            "/orders",
            Method::GET,
            RequestOptions::new().json_body(json!({"ignored": true})),
        )
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn bulk_commission_posts_rounded_prices() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/commission")
        .match_header("content-type", "application/vnd.retailer.v10+json")
        .match_body(Matcher::Json(json!({
            "commissionQueries": [
                {"ean": "8712345678901", "unitPrice": 20.0, "condition": "NEW"},
                {"ean": "8712345678902", "unitPrice": 5.5, "condition": "GOOD"},
            ]
        })))
        .with_status(200)
        .with_header("content-type", "application/vnd.retailer.v10+json")
        .with_body(r#"{"commissions":[]}"#)
        .create_async()
        .await;

    let products = vec![
        CommissionProduct {
            ean: "8712345678901".into(),
            unit_price: 19.999,
            condition: Condition::New,
        },
        CommissionProduct {
            ean: "8712345678902".into(),
            unit_price: 5.5,
            condition: Condition::Good,
        },
    ];
    client(&server).get_commissions_bulk(&products).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn bulk_commission_bounds_are_checked_locally() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/commission")
        .expect(0)
        .create_async()
        .await;
    let client = client(&server);

    let err = client.get_commissions_bulk(&[]).await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));

    let too_many: Vec<_> = (0..101)
        .map(|i| CommissionProduct {
            ean: format!("87123456{i:05}"),
            unit_price: 1.0,
            condition: Condition::New,
        })
        .collect();
    let err = client.get_commissions_bulk(&too_many).await.unwrap_err();
    assert!(err.to_string().contains("got 101"));
    mock.assert_async().await;
}

#[tokio::test]
async fn single_commission_query() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/commission/8712345678901")
        .match_query(Matcher::Exact("unit-price=12.50&condition=AS_NEW".into()))
        .with_status(200)
        .with_header("content-type", "application/vnd.retailer.v10+json")
        .with_body(r#"{"ean":"8712345678901","fixedAmount":0.99}"#)
        .create_async()
        .await;

    let resp = client(&server)
        .get_commission("8712345678901", 12.5, Condition::AsNew)
        .await
        .unwrap();
    assert_eq!(resp.as_json().unwrap()["fixedAmount"], 0.99);
    mock.assert_async().await;
}

#[tokio::test]
async fn token_is_requested_per_call() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/orders")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{}")
        .expect(2)
        .create_async()
        .await;

    let tokens = Arc::new(StaticToken::default());
    let client = RetailerClient::new(&server.url(), Duration::from_secs(5), tokens.clone()).unwrap();
    client.list_orders(&OrderQuery::default()).await.unwrap();
    client.list_orders(&OrderQuery::default()).await.unwrap();
    assert_eq!(tokens.calls.load(Ordering::SeqCst), 2);
}
