//! Authenticated request dispatcher for the Retailer API.

use std::time::{Duration, Instant};

use {
    reqwest::{
        Method, StatusCode,
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue},
    },
    secrecy::ExposeSecret,
    tracing::{debug, warn},
    url::Url,
};

#[cfg(feature = "metrics")]
use bolmcp_metrics::{counter, histogram, labels, retailer as retailer_metrics};

use {
    bolmcp_common::text::body_snippet,
    bolmcp_config::PartnerConfig,
    bolmcp_oauth::SharedTokenProvider,
};

use crate::{
    error::{Error, Result},
    media,
    request::{ApiResponse, RequestOptions},
};

/// Client for the bol.com Retailer API.
///
/// Every call fetches a bearer token from the token provider first; the
/// provider decides whether that means a network round trip.
#[derive(Clone)]
pub struct RetailerClient {
    http: reqwest::Client,
    base_url: String,
    tokens: SharedTokenProvider,
}

impl RetailerClient {
    pub fn new(base_url: &str, timeout: Duration, tokens: SharedTokenProvider) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| Error::external("failed to build retailer HTTP client", source))?;
        Ok(Self::with_client(base_url, http, tokens))
    }

    pub fn with_client(base_url: &str, http: reqwest::Client, tokens: SharedTokenProvider) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    pub fn from_config(partner: &PartnerConfig, tokens: SharedTokenProvider) -> Result<Self> {
        Self::new(
            &partner.api_base_url,
            Duration::from_secs(partner.request_timeout_secs),
            tokens,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_url(&self, path: &str, query: &[(String, String)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{path}", self.base_url))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Perform one authenticated call and classify the response.
    ///
    /// Auth failures surface as [`Error::Auth`] without contacting the API.
    /// Non-2xx responses become [`Error::Api`] with the response body.
    pub async fn call(
        &self,
        path: &str,
        method: Method,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        let endpoint = endpoint_label(path);
        let started = Instant::now();
        let result = self.dispatch(path, &method, options).await;

        #[cfg(feature = "metrics")]
        {
            let status = match &result {
                Ok(_) => "ok".to_string(),
                Err(e) => e.status().map_or_else(|| e.kind().to_string(), |s| s.to_string()),
            };
            counter!(
                retailer_metrics::REQUESTS_TOTAL,
                labels::ENDPOINT => endpoint,
                labels::METHOD => method.to_string(),
                labels::STATUS => status
            )
            .increment(1);
            histogram!(
                retailer_metrics::REQUEST_DURATION_SECONDS,
                labels::ENDPOINT => endpoint
            )
            .record(started.elapsed().as_secs_f64());
            if let Err(e) = &result {
                counter!(
                    retailer_metrics::REQUEST_ERRORS_TOTAL,
                    labels::ENDPOINT => endpoint,
                    labels::ERROR_TYPE => e.kind()
                )
                .increment(1);
            }
        }

        if let Err(e) = &result {
            warn!(
                endpoint,
                method = %method,
                error = %e,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "retailer API call failed"
            );
        }
        result
    }

    async fn dispatch(
        &self,
        path: &str,
        method: &Method,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        let token = self.tokens.access_token().await?;
        let url = self.build_url(path, &options.query)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            header_value(&format!("Bearer {}", token.expose_secret()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static(media::RETAILER_JSON));
        for (name, value) in &options.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::InvalidArgument(format!("header name {name:?}: {e}")))?;
            headers.insert(name, header_value(value)?);
        }

        let mut request = self.http.request(method.clone(), url.clone());
        if let Some(body) = &options.body
            && *method != Method::GET
            && *method != Method::HEAD
        {
            let content_type = options
                .content_type
                .as_deref()
                .unwrap_or(media::RETAILER_JSON);
            headers.insert(CONTENT_TYPE, header_value(content_type)?);
            request = request.body(serde_json::to_vec(body).map_err(|e| {
                Error::InvalidArgument(format!("request body is not serializable: {e}"))
            })?);
        }

        debug!(method = %method, url = %url, "calling retailer API");
        let response = request.headers(headers).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(
                        status = status.as_u16(),
                        error = %e,
                        "failed to read retailer API error body"
                    );
                    String::new()
                },
            };
            warn!(
                status = status.as_u16(),
                body = %body_snippet(&body),
                "retailer API returned an error status"
            );
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(ApiResponse::Empty);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if media::is_json(&content_type) {
            let bytes = response.bytes().await?;
            let value = serde_json::from_slice(&bytes).map_err(|e| {
                Error::Decode(format!(
                    "{e}: {}",
                    body_snippet(&String::from_utf8_lossy(&bytes))
                ))
            })?;
            Ok(ApiResponse::Json(value))
        } else if media::is_pdf(&content_type) {
            let bytes = response.bytes().await?;
            debug!(content_type = %content_type, len = bytes.len(), "received binary document");
            Ok(ApiResponse::Binary {
                content_type,
                bytes,
            })
        } else {
            warn!(content_type = %content_type, "unexpected content type from retailer API");
            let text = response.text().await?;
            Ok(ApiResponse::Text { content_type, text })
        }
    }
}

impl std::fmt::Debug for RetailerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetailerClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| Error::InvalidArgument(format!("header value is not valid: {e}")))
}

/// First path segment, used as a low-cardinality endpoint label.
fn endpoint_label(path: &str) -> &'static str {
    match path.trim_start_matches('/').split('/').next() {
        Some("orders") => "orders",
        Some("invoices") => "invoices",
        Some("commission") => "commission",
        _ => "other",
    }
}
