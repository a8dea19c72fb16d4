//! Configuration management for Memapps
//!
//! Loads settings from TOML file at ~/.memapps/config.toml

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Remote API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Identity of the current user
    #[serde(default)]
    pub user: UserConfig,
}

/// Remote API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the memory service (default: http://localhost:8765)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Optional API key, sent as "Authorization: Bearer <key>"
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:8765".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl ApiConfig {
    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Base URL without a trailing slash
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            api_key: None,
        }
    }
}

/// User identity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    /// User id attached to every scoped request
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

fn default_user_id() -> String {
    "default_user".to_string()
}

impl Default for UserConfig {
    fn default() -> Self {
        UserConfig {
            user_id: default_user_id(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let expanded_path = expand_path(path.as_ref());

        if !expanded_path.exists() {
            return Err(CoreError::Config(format!(
                "Configuration file not found: {}",
                expanded_path.display()
            )));
        }

        let content = std::fs::read_to_string(&expanded_path)?;
        let config: Config = toml::from_str(&content)?;

        Ok(config)
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|p| p.join(".memapps").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".memapps/config.toml"))
    }

    /// Reject settings no request could succeed with
    pub fn validate(&self) -> Result<()> {
        if self.user.user_id.trim().is_empty() {
            return Err(CoreError::Config("user.user_id must not be empty".to_string()));
        }
        let base = self.api.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(CoreError::Config(format!(
                "api.base_url must start with http:// or https:// (got \"{}\")",
                base
            )));
        }
        Ok(())
    }

    /// Get list of active environment overrides
    pub fn active_env_overrides() -> Vec<String> {
        [
            "MEMAPPS_API_URL",
            "NEXT_PUBLIC_API_URL",
            "MEMAPPS_USER_ID",
            "USER_ID",
            "MEMAPPS_API_KEY",
        ]
        .iter()
        .filter(|name| std::env::var(name).is_ok())
        .map(|name| name.to_string())
        .collect()
    }

    /// Apply environment variable overrides
    ///
    /// The MEMAPPS_* names win over the generic ones. Empty values count as unset.
    pub fn apply_env_overrides(&mut self) {
        if let Some(url) = env_non_empty("MEMAPPS_API_URL").or_else(|| env_non_empty("NEXT_PUBLIC_API_URL")) {
            self.api.base_url = url;
        }
        if let Some(user_id) = env_non_empty("MEMAPPS_USER_ID").or_else(|| env_non_empty("USER_ID")) {
            self.user.user_id = user_id;
        }
        if let Ok(key) = std::env::var("MEMAPPS_API_KEY") {
            self.api.api_key = if key.is_empty() { None } else { Some(key) };
        }
    }

    /// Create a default configuration file at the given path
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<()> {
        let content = r#"# Memapps Configuration

[api]
# Base URL of the memory service
base_url = "http://localhost:8765"

# Per-request timeout in seconds
timeout_secs = 30

# Optional API key
# If set, requests carry: Authorization: Bearer <api_key>
# api_key = "your-secret-key"

[user]
# User id sent with every scoped request
user_id = "default_user"
"#;

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;

        Ok(())
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

/// Expand ~ to home directory in paths
pub fn expand_path(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
