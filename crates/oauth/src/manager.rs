use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use {
    async_trait::async_trait,
    bolmcp_common::time::now_millis,
    secrecy::Secret,
    tokio::sync::Mutex,
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use bolmcp_metrics::{counter, oauth as oauth_metrics};

use crate::{
    Error, Result,
    flow::ClientCredentialsFlow,
    storage::{CredentialStore, TOKEN_STORE_KEY},
    types::{AccessToken, Credentials},
};

/// A stored token is reused only while it outlives now by more than this.
pub const DEFAULT_VALIDITY_BUFFER: Duration = Duration::from_secs(120);

/// Anything that can hand out a bearer token for outbound API calls.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<Secret<String>>;
}

pub type SharedTokenProvider = Arc<dyn AccessTokenProvider>;

/// Caches the partner access token in a [`CredentialStore`] and refreshes it
/// through the client-credentials flow when it is missing or about to expire.
///
/// Concurrent callers that all see a stale token share a single refresh,
/// including its failure.
pub struct TokenManager {
    credentials: Option<Credentials>,
    flow: ClientCredentialsFlow,
    store: Arc<dyn CredentialStore>,
    validity_buffer: Duration,
    refresh: Mutex<RefreshSlot>,
    /// Generation of the last finished refresh, readable without the lock.
    completed: AtomicU64,
}

/// Outcome of the most recent token request, handed to callers that queued
/// behind it.
#[derive(Default)]
struct RefreshSlot {
    generation: u64,
    last: Option<std::result::Result<AccessToken, Arc<Error>>>,
}

impl TokenManager {
    /// `credentials` may be `None`; every token request then fails with
    /// [`Error::MissingCredentials`] instead of the server refusing to start.
    pub fn new(
        credentials: Option<Credentials>,
        flow: ClientCredentialsFlow,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            credentials,
            flow,
            store,
            validity_buffer: DEFAULT_VALIDITY_BUFFER,
            refresh: Mutex::new(RefreshSlot::default()),
            completed: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn with_validity_buffer(mut self, buffer: Duration) -> Self {
        self.validity_buffer = buffer;
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    fn buffer_ms(&self) -> u64 {
        u64::try_from(self.validity_buffer.as_millis()).unwrap_or(u64::MAX)
    }

    /// The stored token if present and parseable, regardless of expiry.
    ///
    /// Store read failures and unparseable values count as "no token".
    pub async fn cached_token(&self) -> Option<AccessToken> {
        let value = match self.store.get(TOKEN_STORE_KEY).await {
            Ok(Some(value)) => value,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "credential store read failed, treating as empty");
                return None;
            },
        };
        match serde_json::from_value::<AccessToken>(value) {
            Ok(token) => Some(token),
            Err(e) => {
                warn!(error = %e, "stored access token is malformed, ignoring it");
                None
            },
        }
    }

    async fn valid_cached_token(&self) -> Option<AccessToken> {
        let token = self.cached_token().await?;
        token
            .is_valid_at(now_millis(), self.buffer_ms())
            .then_some(token)
    }

    /// Return a token that stays valid for longer than the validity buffer,
    /// fetching a new one only when needed.
    pub async fn access_token(&self) -> Result<AccessToken> {
        if let Some(token) = self.valid_cached_token().await {
            #[cfg(feature = "metrics")]
            counter!(oauth_metrics::TOKEN_CACHE_HITS_TOTAL).increment(1);
            return Ok(token);
        }

        if self.credentials.is_none() {
            return Err(Error::MissingCredentials);
        }

        let observed = self.completed.load(Ordering::Acquire);
        let mut slot = self.refresh.lock().await;

        // A refresh finished while we waited for the lock: take its result
        // rather than hitting the token endpoint again.
        if slot.generation != observed
            && let Some(last) = &slot.last
        {
            debug!(ok = last.is_ok(), "using outcome of concurrent token refresh");
            #[cfg(feature = "metrics")]
            counter!(oauth_metrics::TOKEN_CACHE_HITS_TOTAL).increment(u64::from(last.is_ok()));
            return last.clone().map_err(Error::Shared);
        }

        if let Some(token) = self.valid_cached_token().await {
            debug!("access token refreshed by another holder of the store");
            #[cfg(feature = "metrics")]
            counter!(oauth_metrics::TOKEN_CACHE_HITS_TOTAL).increment(1);
            return Ok(token);
        }

        let outcome = self.fetch_and_store().await;
        self.publish(&mut slot, outcome)
    }

    /// Fetch a new token even if the stored one is still valid.
    pub async fn refresh(&self) -> Result<AccessToken> {
        let mut slot = self.refresh.lock().await;
        let outcome = self.fetch_and_store().await;
        self.publish(&mut slot, outcome)
    }

    /// Record `outcome` for callers queued on the lock and hand it back.
    fn publish(
        &self,
        slot: &mut RefreshSlot,
        outcome: Result<AccessToken>,
    ) -> Result<AccessToken> {
        let shared = outcome.map_err(Arc::new);
        slot.generation += 1;
        slot.last = Some(shared.clone());
        self.completed.store(slot.generation, Ordering::Release);
        shared.map_err(Error::Shared)
    }

    async fn fetch_and_store(&self) -> Result<AccessToken> {
        let credentials = self.credentials.as_ref().ok_or(Error::MissingCredentials)?;
        let token = self.flow.request_token(credentials).await?;

        match serde_json::to_value(&token) {
            Ok(value) => {
                if let Err(e) = self.store.put(TOKEN_STORE_KEY, value).await {
                    warn!(error = %e, "failed to persist access token, continuing with in-memory copy");
                }
            },
            Err(e) => warn!(error = %e, "failed to serialize access token"),
        }

        info!(
            expires_at_ms = token.expires_at_ms(),
            token_type = %token.token_type(),
            "obtained new partner access token"
        );
        Ok(token)
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("credentials", &self.credentials)
            .field("token_url", &self.flow.token_url().as_str())
            .field("validity_buffer", &self.validity_buffer)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AccessTokenProvider for TokenManager {
    async fn access_token(&self) -> Result<Secret<String>> {
        TokenManager::access_token(self)
            .await
            .map(|token| token.secret().clone())
    }
}
