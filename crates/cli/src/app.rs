//! Builds the running pieces from a loaded config.

use std::{sync::Arc, time::Duration};

use {
    anyhow::Context,
    bolmcp_config::{BolMcpConfig, Severity, validate_config},
    bolmcp_mcp::{CapabilityRegistry, InitOutcome, McpServer, ServerInfo, ToolRouter},
    bolmcp_oauth::{
        ClientCredentialsFlow, CredentialStore, Credentials, FileCredentialStore,
        MemoryCredentialStore, TokenManager,
    },
    bolmcp_retailer::RetailerClient,
    tracing::{error, info, warn},
};

pub const SERVER_INSTRUCTIONS: &str = "Tools for the bol.com Retailer API: list and fetch orders, \
     list invoice requests and fetch invoices (JSON, PDF or HTML), and look up commission for one \
     or up to 100 products.";

/// Log every diagnostic and fail on errors that make the server unusable.
///
/// Missing credentials are logged but tolerated: the server still starts and
/// every tool call reports the authentication failure.
pub fn check_config(config: &BolMcpConfig) -> anyhow::Result<()> {
    let result = validate_config(config);
    let mut fatal = 0;
    for diagnostic in &result.diagnostics {
        match diagnostic.severity {
            Severity::Error => {
                error!(path = %diagnostic.path, "{}", diagnostic.message);
                if !diagnostic.path.starts_with("credentials") {
                    fatal += 1;
                }
            },
            Severity::Warning => warn!(path = %diagnostic.path, "{}", diagnostic.message),
            Severity::Info => info!(path = %diagnostic.path, "{}", diagnostic.message),
        }
    }
    if fatal > 0 {
        anyhow::bail!("configuration has {fatal} error(s)");
    }
    Ok(())
}

pub fn credential_store(config: &BolMcpConfig) -> Arc<dyn CredentialStore> {
    if config.storage.ephemeral {
        info!("using in-memory token store");
        return Arc::new(MemoryCredentialStore::new());
    }
    let path = config
        .storage
        .token_file
        .clone()
        .unwrap_or_else(FileCredentialStore::default_path);
    info!(path = %path.display(), "using file token store");
    Arc::new(FileCredentialStore::new(path))
}

pub fn token_manager(
    config: &BolMcpConfig,
    store: Arc<dyn CredentialStore>,
) -> anyhow::Result<Arc<TokenManager>> {
    let credentials = match Credentials::from_config(&config.credentials) {
        Ok(credentials) => Some(credentials),
        Err(e) => {
            warn!(error = %e, "no partner credentials, tool calls will fail to authenticate");
            None
        },
    };
    let flow = ClientCredentialsFlow::new(
        &config.partner.token_url,
        Duration::from_secs(config.partner.request_timeout_secs),
    )
    .context("invalid token endpoint")?;

    Ok(Arc::new(
        TokenManager::new(credentials, flow, store).with_validity_buffer(Duration::from_secs(
            config.partner.token_validity_buffer_secs,
        )),
    ))
}

/// Wire token manager, API client, registry and router into an MCP server.
pub fn build_server(config: &BolMcpConfig) -> anyhow::Result<Arc<McpServer>> {
    let tokens = token_manager(config, credential_store(config))?;
    let client = Arc::new(
        RetailerClient::from_config(&config.partner, tokens).context("invalid API base URL")?,
    );

    let registry = CapabilityRegistry::new(bolmcp_tools::all_sources(client));
    let router = Arc::new(ToolRouter::new());
    match registry.initialize_once(router.as_ref()) {
        InitOutcome::Initialized(report) => {
            for (name, reason) in &report.rejected {
                warn!(tool = %name, %reason, "tool rejected");
            }
            info!(
                registered = report.registered.len(),
                duplicates = report.duplicates.len(),
                "tools registered"
            );
        },
        InitOutcome::AlreadyInitialized => {},
    }

    let info = ServerInfo {
        name: env!("CARGO_PKG_NAME").into(),
        version: env!("CARGO_PKG_VERSION").into(),
    };
    Ok(Arc::new(
        McpServer::new(router, info).with_instructions(SERVER_INSTRUCTIONS),
    ))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_credentials() -> BolMcpConfig {
        let mut config = BolMcpConfig::default();
        config.credentials.client_id = Some("id".into());
        config.credentials.client_secret = Some(secrecy::Secret::new("secret".into()));
        config.storage.ephemeral = true;
        config
    }

    #[test]
    fn server_exposes_all_tools() {
        let server = build_server(&config_with_credentials()).unwrap();
        assert_eq!(server.router().len(), 6);
    }

    #[test]
    fn missing_credentials_are_not_fatal() {
        let config = BolMcpConfig::default();
        assert!(check_config(&config).is_ok());
        let tokens = token_manager(&config, Arc::new(MemoryCredentialStore::new())).unwrap();
        assert!(!tokens.has_credentials());
    }

    #[test]
    fn bad_base_url_is_fatal() {
        let mut config = config_with_credentials();
        config.partner.api_base_url = "not a url".into();
        assert!(check_config(&config).is_err());
    }

    #[tokio::test]
    async fn token_file_from_config_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_with_credentials();
        config.storage.ephemeral = false;
        config.storage.token_file = Some(dir.path().join("token.json"));

        let store = credential_store(&config);
        store
            .put("marker", serde_json::json!({"ok": true}))
            .await
            .unwrap();
        assert!(dir.path().join("token.json").exists());
    }
}
