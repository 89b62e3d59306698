use std::time::{Duration, Instant};

use {
    bolmcp_common::{text::body_snippet, time::now_millis},
    reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    secrecy::ExposeSecret,
    tracing::{debug, warn},
    url::Url,
};

#[cfg(feature = "metrics")]
use bolmcp_metrics::{counter, histogram, oauth as oauth_metrics};

use crate::{
    Error, Result,
    types::{AccessToken, Credentials, TokenResponse},
};

/// One client-credentials token request against the partner token endpoint.
///
/// This type never caches or retries; [`TokenManager`](crate::TokenManager)
/// decides when a request is needed.
#[derive(Debug, Clone)]
pub struct ClientCredentialsFlow {
    token_url: Url,
    client: reqwest::Client,
}

impl ClientCredentialsFlow {
    /// Build a flow with its own HTTP client limited to `timeout` per request.
    pub fn new(token_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| Error::external("failed to build token HTTP client", source))?;
        Self::with_client(token_url, client)
    }

    /// Build a flow around an existing client (shared connection pool).
    pub fn with_client(token_url: &str, client: reqwest::Client) -> Result<Self> {
        let mut token_url = Url::parse(token_url)
            .map_err(|source| Error::external(format!("invalid token_url {token_url}"), source))?;
        token_url
            .query_pairs_mut()
            .append_pair("grant_type", "client_credentials");
        Ok(Self { token_url, client })
    }

    /// Full request URL including `grant_type`.
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    /// POST the grant and parse the issued token.
    ///
    /// Non-success statuses fail with [`Error::TokenEndpoint`] carrying the
    /// status and a snippet of the response body.
    pub async fn request_token(&self, credentials: &Credentials) -> Result<AccessToken> {
        #[cfg(feature = "metrics")]
        counter!(oauth_metrics::TOKEN_REFRESH_TOTAL).increment(1);

        let issued_at = now_millis();
        let started = Instant::now();
        let result = self.send(credentials, issued_at).await;

        #[cfg(feature = "metrics")]
        {
            histogram!(oauth_metrics::TOKEN_REFRESH_DURATION_SECONDS)
                .record(started.elapsed().as_secs_f64());
            if result.is_err() {
                counter!(oauth_metrics::TOKEN_REFRESH_FAILURES_TOTAL).increment(1);
            }
        }

        debug!(
            client_id = %credentials.client_id(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "token request finished"
        );
        result
    }

    async fn send(&self, credentials: &Credentials, issued_at: u64) -> Result<AccessToken> {
        let response = self
            .client
            .post(self.token_url.clone())
            .header(AUTHORIZATION, credentials.basic_authorization().expose_secret())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let body = body_snippet(&body);
            warn!(
                status = status.as_u16(),
                body = %body,
                "token endpoint rejected client credentials request"
            );
            return Err(Error::TokenEndpoint {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| Error::InvalidResponse(format!("{e}: {}", body_snippet(&body))))?;
        if parsed.access_token.is_empty() {
            return Err(Error::InvalidResponse("empty access_token".into()));
        }

        Ok(AccessToken::from_response(parsed, issued_at))
    }
}
