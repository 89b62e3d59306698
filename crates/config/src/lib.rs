//! Configuration loading, env substitution, and validation.
//!
//! Config files: `bol-mcp.toml`, `bol-mcp.yaml`, `bol-mcp.yml` or `bol-mcp.json`,
//! searched in `./` then `~/.config/bol-mcp/`.
//!
//! String values support `${ENV_VAR}` and `${ENV_VAR:-default}` substitution.
//! Partner credentials fall back to `BOL_CLIENT_ID` / `BOL_CLIENT_SECRET`.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{
        apply_env_overrides, config_dir, discover_and_load, find_config_file, load_config,
        set_config_dir,
    },
    schema::{
        BolMcpConfig, CredentialsConfig, MetricsConfig, PartnerConfig, ServerConfig,
        StorageConfig, TransportKind,
    },
    validate::{Diagnostic, Severity, ValidationResult, validate_config},
};
