//! Configuration validation.
//!
//! Checks a loaded [`BolMcpConfig`] for settings that would make the server
//! unusable at runtime and reports them as diagnostics instead of failing on
//! the first tool call.

use url::Url;

use crate::{env_subst::unresolved_placeholders, schema::BolMcpConfig};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "partner.token_url"
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.path, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(&mut self, severity: Severity, path: &str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path: path.to_string(),
            message: message.into(),
        });
    }
}

/// Validate a loaded config.
#[must_use]
pub fn validate_config(config: &BolMcpConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    if !config.credentials.is_complete() {
        result.push(
            Severity::Error,
            "credentials",
            "client_id and client_secret are required (or set BOL_CLIENT_ID / BOL_CLIENT_SECRET)",
        );
    }
    if let Some(id) = &config.credentials.client_id {
        for name in unresolved_placeholders(id) {
            result.push(
                Severity::Error,
                "credentials.client_id",
                format!("environment variable {name} is not set"),
            );
        }
    }

    check_url(&mut result, "partner.token_url", &config.partner.token_url);
    check_url(
        &mut result,
        "partner.api_base_url",
        &config.partner.api_base_url,
    );

    if config.partner.api_base_url.ends_with('/') {
        result.push(
            Severity::Warning,
            "partner.api_base_url",
            "trailing '/' produces double slashes when endpoint paths are appended",
        );
    }
    if config.partner.request_timeout_secs == 0 {
        result.push(
            Severity::Error,
            "partner.request_timeout_secs",
            "must be greater than zero",
        );
    }
    if config.partner.token_validity_buffer_secs == 0 {
        result.push(
            Severity::Warning,
            "partner.token_validity_buffer_secs",
            "a zero buffer lets tokens expire mid-request",
        );
    }
    if config.storage.ephemeral && config.storage.token_file.is_some() {
        result.push(
            Severity::Info,
            "storage.token_file",
            "ignored because storage.ephemeral is set",
        );
    }

    result
}

fn check_url(result: &mut ValidationResult, path: &str, value: &str) {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            if url.scheme() == "http" && !is_loopback(&url) {
                result.push(
                    Severity::Warning,
                    path,
                    "plain http sends credentials unencrypted",
                );
            }
        },
        Ok(url) => result.push(
            Severity::Error,
            path,
            format!("unsupported scheme '{}'", url.scheme()),
        ),
        Err(e) => result.push(Severity::Error, path, format!("invalid URL: {e}")),
    }
}

fn is_loopback(url: &Url) -> bool {
    matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"))
}

#[cfg(test)]
mod tests {
    use {super::*, secrecy::Secret};

    fn complete() -> BolMcpConfig {
        let mut cfg = BolMcpConfig::default();
        cfg.credentials.client_id = Some("id".into());
        cfg.credentials.client_secret = Some(Secret::new("secret".into()));
        cfg
    }

    #[test]
    fn complete_default_config_is_clean() {
        let result = validate_config(&complete());
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    }

    #[test]
    fn missing_credentials_is_an_error() {
        let result = validate_config(&BolMcpConfig::default());
        assert!(result.has_errors());
        assert_eq!(result.diagnostics[0].path, "credentials");
    }

    #[test]
    fn unresolved_client_id_is_reported() {
        let mut cfg = complete();
        cfg.credentials.client_id = Some("${BOL_CLIENT_ID}".into());
        let result = validate_config(&cfg);
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.path == "credentials.client_id")
        );
    }

    #[test]
    fn bad_urls_and_timeouts() {
        let mut cfg = complete();
        cfg.partner.token_url = "ftp://login.bol.com/token".into();
        cfg.partner.api_base_url = "not a url".into();
        cfg.partner.request_timeout_secs = 0;
        let result = validate_config(&cfg);
        assert_eq!(result.count(Severity::Error), 3);
    }

    #[test]
    fn loopback_http_is_allowed() {
        let mut cfg = complete();
        cfg.partner.token_url = "http://127.0.0.1:8080/token".into();
        assert!(validate_config(&cfg).diagnostics.is_empty());
    }
}
