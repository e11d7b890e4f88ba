//! Application configuration for docbridge.
//!
//! User config lives at `~/.docbridge/docbridge.toml`.
//! CLI flags (and their environment fallbacks) override config file values,
//! which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DocBridgeError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "docbridge.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docbridge";

/// Default Deploy API endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://deploy.heretto.com/v3";

// ---------------------------------------------------------------------------
// Config structs (matching docbridge.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Deploy API connection settings.
    #[serde(default)]
    pub api: ApiSection,

    /// Default organization / deployment.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Documentation portal settings.
    #[serde(default)]
    pub portal: PortalSection,
}

/// `[api]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSection {
    /// Deploy API base URL.
    #[serde(default = "default_api_base_url")]
    pub base_url: String,

    /// Name of the env var holding the deploy token (never store the token itself).
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            token_env: default_token_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.into()
}
fn default_token_env() -> String {
    "DOCBRIDGE_DEPLOY_TOKEN".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[defaults]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Organization used when a tool call omits `organization_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,

    /// Deployment used when a tool call omits `deployment_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_id: Option<String>,
}

/// `[portal]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortalSection {
    /// Public portal root that document paths are appended to.
    /// Empty disables portal URL generation.
    #[serde(default)]
    pub base_url: String,
}

// ---------------------------------------------------------------------------
// Runtime config (merged from config file + CLI flags / env)
// ---------------------------------------------------------------------------

/// Deploy API client settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL without trailing slash.
    pub base_url: String,
    /// Deploy token, sent as `X-Deploy-API-Auth` when present.
    pub token: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.into(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Values supplied on the command line (or their env fallbacks).
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_base_url: Option<String>,
    pub token: Option<String>,
    pub organization_id: Option<String>,
    pub deployment_id: Option<String>,
    pub portal_base_url: Option<String>,
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct BridgeConfig {
    pub api: ApiConfig,
    pub default_organization_id: Option<String>,
    pub default_deployment_id: Option<String>,
    /// Portal base without trailing slash; empty when unset.
    pub portal_base_url: String,
}

impl BridgeConfig {
    /// Merge overrides on top of the file config and validate the result.
    pub fn resolve(config: &AppConfig, overrides: &ConfigOverrides) -> Result<Self> {
        let api_base_url = overrides
            .api_base_url
            .clone()
            .unwrap_or_else(|| config.api.base_url.clone());
        let api_base_url = validate_base_url("API base URL", &api_base_url)?;

        let token = overrides
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| read_token(&config.api.token_env));

        let portal_base_url = overrides
            .portal_base_url
            .clone()
            .unwrap_or_else(|| config.portal.base_url.clone());
        let portal_base_url = if portal_base_url.trim().is_empty() {
            String::new()
        } else {
            validate_base_url("portal base URL", &portal_base_url)?
        };

        Ok(Self {
            api: ApiConfig {
                base_url: api_base_url,
                token,
                timeout_secs: config.api.timeout_secs,
            },
            default_organization_id: non_empty(
                overrides
                    .organization_id
                    .clone()
                    .or_else(|| config.defaults.organization_id.clone()),
            ),
            default_deployment_id: non_empty(
                overrides
                    .deployment_id
                    .clone()
                    .or_else(|| config.defaults.deployment_id.clone()),
            ),
            portal_base_url,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn read_token(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Some(val),
        _ => {
            tracing::debug!(var_name, "deploy token env var not set");
            None
        }
    }
}

/// Check that `raw` is an absolute http(s) URL and strip trailing slashes.
fn validate_base_url(label: &str, raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed)
        .map_err(|e| DocBridgeError::config(format!("invalid {label} '{raw}': {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        other => Err(DocBridgeError::config(format!(
            "invalid {label} '{raw}': unsupported scheme '{other}'"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.docbridge/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DocBridgeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.docbridge/docbridge.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocBridgeError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        DocBridgeError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DocBridgeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocBridgeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocBridgeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("base_url"));
        assert!(toml_str.contains("DOCBRIDGE_DEPLOY_TOKEN"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.api.base_url, DEFAULT_API_BASE_URL);
        assert_eq!(parsed.api.timeout_secs, 30);
        assert!(parsed.defaults.organization_id.is_none());
    }

    #[test]
    fn config_with_defaults_and_portal() {
        let toml_str = r#"
[defaults]
organization_id = "acme"
deployment_id = "docs"

[portal]
base_url = "https://help.acme.com/"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.organization_id.as_deref(), Some("acme"));
        assert_eq!(config.portal.base_url, "https://help.acme.com/");
        assert_eq!(config.api.base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn resolve_trims_trailing_slashes() {
        let mut app = AppConfig::default();
        app.portal.base_url = "https://help.acme.com/".into();
        app.api.base_url = "https://api.acme.com/v3/".into();
        let resolved = BridgeConfig::resolve(&app, &ConfigOverrides::default()).expect("resolve");
        assert_eq!(resolved.portal_base_url, "https://help.acme.com");
        assert_eq!(resolved.api.base_url, "https://api.acme.com/v3");
    }

    #[test]
    fn overrides_win_over_file_values() {
        let mut app = AppConfig::default();
        app.defaults.organization_id = Some("from-file".into());
        app.defaults.deployment_id = Some("dep-file".into());
        let overrides = ConfigOverrides {
            organization_id: Some("from-flag".into()),
            token: Some("secret".into()),
            ..Default::default()
        };
        let resolved = BridgeConfig::resolve(&app, &overrides).expect("resolve");
        assert_eq!(resolved.default_organization_id.as_deref(), Some("from-flag"));
        assert_eq!(resolved.default_deployment_id.as_deref(), Some("dep-file"));
        assert_eq!(resolved.api.token.as_deref(), Some("secret"));
    }

    #[test]
    fn empty_portal_disables_urls() {
        let resolved =
            BridgeConfig::resolve(&AppConfig::default(), &ConfigOverrides::default())
                .expect("resolve");
        assert!(resolved.portal_base_url.is_empty());
    }

    #[test]
    fn invalid_portal_url_rejected() {
        let overrides = ConfigOverrides {
            portal_base_url: Some("ftp://files.example.com".into()),
            ..Default::default()
        };
        let err = BridgeConfig::resolve(&AppConfig::default(), &overrides).unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn missing_token_env_is_not_an_error() {
        let mut app = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        app.api.token_env = "DOCBRIDGE_TEST_NONEXISTENT_TOKEN_12345".into();
        let resolved = BridgeConfig::resolve(&app, &ConfigOverrides::default()).expect("resolve");
        assert!(resolved.api.token.is_none());
    }
}
