use std::{
    path::{Path, PathBuf},
    sync::RwLock,
};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::BolMcpConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "bol-mcp.toml",
    "bol-mcp.yaml",
    "bol-mcp.yml",
    "bol-mcp.json",
];

static CONFIG_DIR_OVERRIDE: RwLock<Option<PathBuf>> = RwLock::new(None);

/// Override the user-global config directory (`--config-dir`).
pub fn set_config_dir(dir: PathBuf) {
    if let Ok(mut slot) = CONFIG_DIR_OVERRIDE.write() {
        *slot = Some(dir);
    }
}

/// Returns the user-global config directory.
///
/// Resolution order:
/// 1. programmatic override (`set_config_dir`)
/// 2. `BOL_MCP_CONFIG_DIR`
/// 3. `~/.config/bol-mcp`
pub fn config_dir() -> Option<PathBuf> {
    if let Some(dir) = CONFIG_DIR_OVERRIDE.read().ok().and_then(|d| d.clone()) {
        return Some(dir);
    }
    if let Some(dir) = std::env::var_os("BOL_MCP_CONFIG_DIR").filter(|d| !d.is_empty()) {
        return Some(PathBuf::from(dir));
    }
    directories::ProjectDirs::from("", "", "bol-mcp").map(|d| d.config_dir().to_path_buf())
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<BolMcpConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations, then apply environment
/// overrides.
///
/// Search order:
/// 1. `./bol-mcp.{toml,yaml,yml,json}` (project-local)
/// 2. `<config dir>/bol-mcp.{toml,yaml,yml,json}` (user-global)
///
/// Falls back to `BolMcpConfig::default()` if no file is found or it fails to
/// parse.
pub fn discover_and_load() -> BolMcpConfig {
    let mut config = match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                BolMcpConfig::default()
            })
        },
        None => {
            debug!("no config file found, using defaults");
            BolMcpConfig::default()
        },
    };
    apply_env_overrides(&mut config);
    config
}

/// Apply `BOL_CLIENT_ID`, `BOL_CLIENT_SECRET` and `BOL_MCP_*` variables on top
/// of a loaded config.
pub fn apply_env_overrides(config: &mut BolMcpConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(config: &mut BolMcpConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(id) = get("BOL_CLIENT_ID") {
        config.credentials.client_id = Some(id);
    }
    if let Some(secret) = get("BOL_CLIENT_SECRET") {
        config.credentials.client_secret = Some(Secret::new(secret));
    }
    if let Some(url) = get("BOL_MCP_TOKEN_URL") {
        config.partner.token_url = url;
    }
    if let Some(url) = get("BOL_MCP_API_BASE_URL") {
        config.partner.api_base_url = url;
    }
    if let Some(raw) = get("BOL_MCP_REQUEST_TIMEOUT_SECS") {
        match raw.parse() {
            Ok(secs) => config.partner.request_timeout_secs = secs,
            Err(e) => warn!(value = %raw, error = %e, "ignoring invalid BOL_MCP_REQUEST_TIMEOUT_SECS"),
        }
    }
    if let Some(path) = get("BOL_MCP_TOKEN_FILE") {
        config.storage.token_file = Some(PathBuf::from(path));
    }
    if let Some(raw) = get("BOL_MCP_TRANSPORT") {
        match raw.parse() {
            Ok(kind) => config.server.transport = kind,
            Err(e) => warn!(value = %raw, error = %e, "ignoring invalid BOL_MCP_TRANSPORT"),
        }
    }
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<BolMcpConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
