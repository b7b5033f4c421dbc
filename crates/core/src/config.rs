//! TOML-based configuration for branchmerge.
//!
//! Credentials (stack API key, management token) are stored as `_env` fields
//! that reference environment variable names. The actual secrets are resolved
//! at runtime via [`AppConfig::resolve_env_vars`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::ConfigError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level application configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Management API endpoint and credentials.
    #[serde(default)]
    pub api: ApiConfig,

    /// Branch comparison settings.
    #[serde(default)]
    pub diff: DiffConfig,

    /// Merge job settings.
    #[serde(default)]
    pub merge: MergeConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// API
// ---------------------------------------------------------------------------

/// Management API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API base URL (default `https://api.contentstack.io`).
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Environment variable holding the stack API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Environment variable holding the management token.
    #[serde(default = "default_management_token_env")]
    pub management_token_env: String,

    /// Resolved stack API key (populated by `resolve_env_vars`).
    #[serde(skip)]
    pub api_key: Option<String>,

    /// Resolved management token.
    #[serde(skip)]
    pub management_token: Option<String>,
}

fn default_api_url() -> String {
    "https://api.contentstack.io".into()
}
fn default_api_key_env() -> String {
    "BRANCHMERGE_API_KEY".into()
}
fn default_management_token_env() -> String {
    "BRANCHMERGE_MANAGEMENT_TOKEN".into()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key_env: default_api_key_env(),
            management_token_env: default_management_token_env(),
            api_key: None,
            management_token: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Diff
// ---------------------------------------------------------------------------

/// Branch comparison configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Items requested per comparison page (default 100).
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
}

fn default_page_limit() -> u32 {
    100
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            page_limit: default_page_limit(),
        }
    }
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Merge job configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Seconds between merge queue status checks (default 5).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Give up after this many status checks. `0` waits indefinitely.
    #[serde(default)]
    pub max_poll_attempts: u32,

    /// Directory where failed-merge error logs are written.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

fn default_poll_interval() -> u64 {
    5
}
fn default_log_dir() -> PathBuf {
    PathBuf::from("./merge-logs")
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            max_poll_attempts: 0,
            log_dir: default_log_dir(),
        }
    }
}

impl MergeConfig {
    /// Interval between queue status checks.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Attempt cap, or `None` when polling is unbounded.
    pub fn attempt_limit(&self) -> Option<u32> {
        (self.max_poll_attempts > 0).then_some(self.max_poll_attempts)
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Log output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "warn".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & resolving
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Load an [`AppConfig`] from a TOML file at the given path.
    ///
    /// This does **not** resolve environment variables -- call
    /// [`resolve_env_vars`](Self::resolve_env_vars) afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Resolve the `*_env` fields from environment variables.
    ///
    /// Missing variables only log a warning; [`require_credentials`]
    /// decides whether a command can run without them.
    ///
    /// [`require_credentials`]: Self::require_credentials
    pub fn resolve_env_vars(&mut self) {
        info!("resolving environment variable references in config");

        self.api.api_key = resolve_optional_env(&self.api.api_key_env, "api.api_key_env");
        self.api.management_token =
            resolve_optional_env(&self.api.management_token_env, "api.management_token_env");

        debug!("environment variable resolution complete");
    }

    /// Validate that all values are sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.api_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api.api_url".into(),
                detail: "API URL must not be empty".into(),
            });
        }
        if !self.api.api_url.starts_with("http://") && !self.api.api_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                field: "api.api_url".into(),
                detail: "API URL must start with http:// or https://".into(),
            });
        }
        if self.diff.page_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "diff.page_limit".into(),
                detail: "page limit must be > 0".into(),
            });
        }
        if self.merge.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "merge.poll_interval_secs".into(),
                detail: "poll interval must be > 0".into(),
            });
        }

        Ok(())
    }

    /// Fail unless both the API key and the management token are resolved.
    pub fn require_credentials(&self) -> Result<(&str, &str), ConfigError> {
        let api_key = self
            .api
            .api_key
            .as_deref()
            .ok_or_else(|| ConfigError::EnvVarMissing {
                var: self.api.api_key_env.clone(),
                field: "api.api_key_env".into(),
            })?;
        let token = self
            .api
            .management_token
            .as_deref()
            .ok_or_else(|| ConfigError::EnvVarMissing {
                var: self.api.management_token_env.clone(),
                field: "api.management_token_env".into(),
            })?;
        Ok((api_key, token))
    }

    /// Convenience: load, resolve, and validate in one call.
    pub fn load_and_resolve<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.resolve_env_vars();
        config.validate()?;
        Ok(config)
    }
}

/// Try to read an environment variable by name. Returns `Some(value)` on
/// success; logs a warning and returns `None` if the variable is unset.
fn resolve_optional_env(env_name: &str, field: &str) -> Option<String> {
    match std::env::var(env_name) {
        Ok(val) if !val.is_empty() => {
            debug!(field, env_name, "resolved env var");
            Some(val)
        }
        Ok(_) => {
            warn!(field, env_name, "env var is set but empty");
            None
        }
        Err(_) => {
            warn!(field, env_name, "env var not set");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_toml() -> &'static str {
        r#"
[api]
api_url = "https://eu-api.contentstack.com"
api_key_env = "STACK_KEY"
management_token_env = "STACK_TOKEN"

[diff]
page_limit = 50

[merge]
poll_interval_secs = 10
max_poll_attempts = 120
log_dir = "/tmp/branchmerge-logs"

[logging]
log_level = "debug"
"#
    }

    #[test]
    fn test_parse_full_config() {
        let config: AppConfig = toml::from_str(sample_toml()).expect("failed to parse toml");
        assert_eq!(config.api.api_url, "https://eu-api.contentstack.com");
        assert_eq!(config.diff.page_limit, 50);
        assert_eq!(config.merge.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.merge.attempt_limit(), Some(120));
        assert_eq!(config.logging.log_level, "debug");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(sample_toml().as_bytes()).unwrap();

        let config = AppConfig::load_from_file(&path).expect("load_from_file failed");
        assert_eq!(config.merge.log_dir, PathBuf::from("/tmp/branchmerge-logs"));
    }

    #[test]
    fn test_file_not_found() {
        let result = AppConfig::load_from_file("/nonexistent/config.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_validate_rejects_zero_page_limit() {
        let mut config: AppConfig = toml::from_str(sample_toml()).unwrap();
        config.diff.page_limit = 0;
        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "diff.page_limit"
        ));
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config: AppConfig = toml::from_str(sample_toml()).unwrap();
        config.api.api_url = "api.contentstack.io".into();
        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "api.api_url"
        ));
    }

    #[test]
    fn test_resolve_env_vars() {
        std::env::set_var("TEST_BM_KEY", "blt_key");
        std::env::set_var("TEST_BM_TOKEN", "cs_token");

        let toml_str = r#"
[api]
api_key_env = "TEST_BM_KEY"
management_token_env = "TEST_BM_TOKEN"
"#;
        let mut config: AppConfig = toml::from_str(toml_str).unwrap();
        config.resolve_env_vars();

        assert_eq!(config.require_credentials().unwrap(), ("blt_key", "cs_token"));

        std::env::remove_var("TEST_BM_KEY");
        std::env::remove_var("TEST_BM_TOKEN");
    }

    #[test]
    fn test_missing_credentials() {
        let mut config = AppConfig::default();
        config.api.api_key_env = "TEST_BM_UNSET_KEY".into();
        config.resolve_env_vars();
        let result = config.require_credentials();
        assert!(matches!(
            result,
            Err(ConfigError::EnvVarMissing { ref var, .. }) if var == "TEST_BM_UNSET_KEY"
        ));
    }

    #[test]
    fn test_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.api.api_url, "https://api.contentstack.io");
        assert_eq!(config.diff.page_limit, 100);
        assert_eq!(config.merge.poll_interval_secs, 5);
        assert_eq!(config.merge.attempt_limit(), None);
        assert_eq!(config.logging.log_level, "warn");
        assert!(config.validate().is_ok());
    }
}
