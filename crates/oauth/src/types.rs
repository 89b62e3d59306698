use {
    base64::{Engine, engine::general_purpose::STANDARD},
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

use crate::{Error, Result};

/// Client id + secret for the client-credentials grant.
#[derive(Clone)]
pub struct Credentials {
    client_id: String,
    client_secret: Secret<String>,
}

impl Credentials {
    /// Both halves must be non-blank.
    pub fn new(client_id: impl Into<String>, client_secret: Secret<String>) -> Result<Self> {
        let client_id = client_id.into();
        if client_id.trim().is_empty() || client_secret.expose_secret().trim().is_empty() {
            return Err(Error::MissingCredentials);
        }
        Ok(Self {
            client_id,
            client_secret,
        })
    }

    /// Build from the `[credentials]` config section.
    pub fn from_config(config: &bolmcp_config::CredentialsConfig) -> Result<Self> {
        match (&config.client_id, &config.client_secret) {
            (Some(id), Some(secret)) => Self::new(id.clone(), secret.clone()),
            _ => Err(Error::MissingCredentials),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Value for an `Authorization: Basic …` header.
    pub fn basic_authorization(&self) -> Secret<String> {
        Secret::new(format!(
            "Basic {}",
            encode_credentials(&self.client_id, self.client_secret.expose_secret())
        ))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Base64 of `"<client_id>:<client_secret>"` over its UTF-8 bytes.
///
/// Non-ASCII ids and secrets need no special casing: a Rust `str` is already
/// UTF-8, so the bytes that get encoded are exactly what the token endpoint
/// decodes.
#[must_use]
pub fn encode_credentials(client_id: &str, client_secret: &str) -> String {
    STANDARD.encode(format!("{client_id}:{client_secret}").as_bytes())
}

/// A bearer token issued by the token endpoint.
///
/// Stored as `{access_token, token_type, scope?, expiry_time}` where
/// `expiry_time` is epoch milliseconds.
#[derive(Clone, Serialize, Deserialize)]
pub struct AccessToken {
    #[serde(rename = "access_token", serialize_with = "serialize_secret")]
    token: Secret<String>,
    token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
    #[serde(rename = "expiry_time")]
    expires_at_ms: u64,
}

impl AccessToken {
    pub(crate) fn from_response(response: TokenResponse, issued_at_ms: u64) -> Self {
        Self {
            token: Secret::new(response.access_token),
            token_type: response.token_type,
            scope: response.scope,
            expires_at_ms: issued_at_ms.saturating_add(response.expires_in.saturating_mul(1000)),
        }
    }

    pub fn secret(&self) -> &Secret<String> {
        &self.token
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn expires_at_ms(&self) -> u64 {
        self.expires_at_ms
    }

    /// True while the token stays valid for more than `buffer_ms` after `now_ms`.
    #[must_use]
    pub fn is_valid_at(&self, now_ms: u64, buffer_ms: u64) -> bool {
        self.expires_at_ms > now_ms.saturating_add(buffer_ms)
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .field("expires_at_ms", &self.expires_at_ms)
            .finish()
    }
}

/// Token endpoint success body.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    /// Lifetime in seconds.
    pub expires_in: u64,
    pub token_type: String,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Serialize a `Secret<String>` by exposing its inner value.
/// Use only for fields that must round-trip through the credential store.
pub fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn decode(encoded: &str) -> String {
        String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap()
    }

    #[test]
    fn encodes_ascii_credentials() {
        let encoded = encode_credentials("client", "secret");
        assert_eq!(encoded, "Y2xpZW50OnNlY3JldA==");
        assert_eq!(decode(&encoded), "client:secret");
    }

    #[test]
    fn encodes_non_ascii_credentials() {
        let encoded = encode_credentials("klänt-ïd", "sécrét€");
        assert_eq!(decode(&encoded), "klänt-ïd:sécrét€");
    }

    #[test]
    fn secret_may_contain_colons() {
        assert_eq!(decode(&encode_credentials("id", "a:b")), "id:a:b");
    }

    #[test]
    fn blank_credentials_are_missing() {
        let err = Credentials::new(" ", Secret::new("s".into())).unwrap_err();
        assert!(matches!(err, Error::MissingCredentials));
        let err = Credentials::new("id", Secret::new(String::new())).unwrap_err();
        assert!(matches!(err, Error::MissingCredentials));
    }

    #[test]
    fn basic_authorization_header() {
        let creds = Credentials::new("client", Secret::new("secret".into())).unwrap();
        assert_eq!(
            creds.basic_authorization().expose_secret(),
            "Basic Y2xpZW50OnNlY3JldA=="
        );
    }

    #[test]
    fn credentials_debug_is_redacted() {
        let creds = Credentials::new("client", Secret::new("hunter2".into())).unwrap();
        let debug = format!("{creds:?}");
        assert!(debug.contains("client"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn expiry_is_computed_from_issue_time() {
        let token = AccessToken::from_response(
            TokenResponse {
                access_token: "abc".into(),
                expires_in: 299,
                token_type: "Bearer".into(),
                scope: Some("RETAILER".into()),
            },
            1_000,
        );
        assert_eq!(token.expires_at_ms(), 300_000);
        assert!(token.is_valid_at(179_999, 120_000));
        assert!(!token.is_valid_at(180_000, 120_000));
    }

    #[test]
    fn stored_layout_round_trips() {
        let json = serde_json::json!({
            "access_token": "abc",
            "token_type": "Bearer",
            "expiry_time": 42,
        });
        let token: AccessToken = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(token.secret().expose_secret(), "abc");
        assert_eq!(token.scope(), None);
        assert_eq!(serde_json::to_value(&token).unwrap(), json);
        assert!(!format!("{token:?}").contains("abc"));
    }
}
