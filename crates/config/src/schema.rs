//! Config schema types.

use std::path::PathBuf;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

pub const DEFAULT_TOKEN_URL: &str = "https://login.bol.com/token";
pub const DEFAULT_API_BASE_URL: &str = "https://api.bol.com/retailer";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TOKEN_VALIDITY_BUFFER_SECS: u64 = 120;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BolMcpConfig {
    pub credentials: CredentialsConfig,
    pub partner: PartnerConfig,
    pub storage: StorageConfig,
    pub server: ServerConfig,
    pub metrics: MetricsConfig,
}

/// Client-credentials pair for the partner token endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub client_id: Option<String>,
    #[serde(
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub client_secret: Option<Secret<String>>,
}

impl CredentialsConfig {
    /// Both halves present and non-blank.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        let id_ok = self
            .client_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty());
        let secret_ok = self
            .client_secret
            .as_ref()
            .is_some_and(|s| !s.expose_secret().trim().is_empty());
        id_ok && secret_ok
    }
}

/// Partner endpoints and network behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PartnerConfig {
    /// OAuth2 token endpoint; `grant_type=client_credentials` is appended.
    pub token_url: String,
    /// Retailer API base; endpoint paths are appended verbatim.
    pub api_base_url: String,
    /// Timeout for every outbound HTTP call.
    pub request_timeout_secs: u64,
    /// A cached token is reused only while it stays valid for this long.
    pub token_validity_buffer_secs: u64,
}

impl Default for PartnerConfig {
    fn default() -> Self {
        Self {
            token_url: DEFAULT_TOKEN_URL.into(),
            api_base_url: DEFAULT_API_BASE_URL.into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            token_validity_buffer_secs: DEFAULT_TOKEN_VALIDITY_BUFFER_SECS,
        }
    }
}

/// Where the access token is persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Token file. Defaults to `<config dir>/credentials.json`.
    pub token_file: Option<PathBuf>,
    /// Keep the token in memory only; every restart fetches a fresh one.
    pub ephemeral: bool,
}

/// How the MCP server is exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Stdio,
    Http,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => f.write_str("stdio"),
            Self::Http => f.write_str("http"),
        }
    }
}

impl std::str::FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdio" => Ok(Self::Stdio),
            "http" => Ok(Self::Http),
            other => Err(format!("unknown transport '{other}' (expected stdio or http)")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub transport: TransportKind,
    /// Address to bind to for the HTTP transport. Defaults to "127.0.0.1".
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::default(),
            bind: "127.0.0.1".into(),
            port: 8787,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
}

// ── Serde helpers for Secret<String> ────────────────────────────────────────

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}
