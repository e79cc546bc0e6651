//! User configuration, read from `~/.scopebench/config.yaml`

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::constants::{APP_NAME, DEFAULT_AUTHORITY, DEFAULT_SCOPE, DEFAULT_TIMEOUT_SECS};

/// Environment variable naming an alternative config file
pub const CONFIG_ENV: &str = "SCOPEBENCH_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Application (client) id registered with the identity platform
    pub client_id: Option<String>,
    pub authority: String,
    /// Fixed bearer token; skips the identity platform entirely
    pub static_token: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            client_id: None,
            authority: String::from(DEFAULT_AUTHORITY),
            static_token: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub auth: AuthConfig,
    /// Scope used when a request URL has no recognisable host
    pub default_scope: String,
    pub http: HttpConfig,
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            auth: AuthConfig::default(),
            default_scope: String::from(DEFAULT_SCOPE),
            http: HttpConfig::default(),
            log_file: PathBuf::from(format!("{}.log", APP_NAME)),
        }
    }
}

impl Config {
    /// Load from `$SCOPEBENCH_CONFIG`, else the default location
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(default_path);
        Self::load_from(&path)
    }

    /// A missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        tracing::info!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }
}

fn default_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(format!(".{}", APP_NAME))
        .join("config.yaml")
}
