//! Configuration Management
//!
//! Provider settings come from a YAML file and are overridden by
//! `ARTIFACTORY_*` environment variables.

use crate::artifactory::auth::Credentials;
use crate::error::{ProviderError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 300;

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Artifactory base URL, e.g. `https://myinstance.jfrog.io`
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Timeout applied to every request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            url: None,
            username: None,
            password: None,
            api_key: None,
            access_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ProviderConfig {
    /// Get the default config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("artifactory-provider").join("config.yaml"))
    }

    /// Load configuration from the default location, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        Self::load_from(&path).unwrap_or_else(|e| {
            tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
            Self::default()
        })
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| ProviderError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to disk
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            serde_yaml::to_string(self).map_err(|e| ProviderError::encode("provider config", e))?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Save to `path`, or to the default location when none is given
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()
                .ok_or_else(|| ProviderError::Config("no config directory".to_string()))?,
        };
        self.save_to(&path)?;
        Ok(path)
    }

    /// Apply `ARTIFACTORY_*` variables from the process environment
    pub fn with_env(self) -> Self {
        self.with_env_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from any variable source
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let set = |slot: &mut Option<String>, name: &str| {
            if let Some(value) = lookup(name).filter(|v| !v.is_empty()) {
                *slot = Some(value);
            }
        };

        set(&mut self.url, "ARTIFACTORY_URL");
        set(&mut self.username, "ARTIFACTORY_USERNAME");
        set(&mut self.password, "ARTIFACTORY_PASSWORD");
        set(&mut self.api_key, "ARTIFACTORY_API_KEY");
        set(&mut self.access_token, "ARTIFACTORY_ACCESS_TOKEN");

        if let Some(secs) = lookup("ARTIFACTORY_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.timeout_secs = secs;
        }

        self
    }

    /// Base URL without trailing slash
    pub fn effective_url(&self) -> Result<String> {
        let url = self
            .url
            .as_deref()
            .map(|u| u.trim_end_matches('/'))
            .filter(|u| !u.is_empty())
            .ok_or_else(|| {
                ProviderError::Config(
                    "no Artifactory url configured (set `url` or ARTIFACTORY_URL)".to_string(),
                )
            })?;

        url::Url::parse(url)
            .map_err(|e| ProviderError::Config(format!("invalid url {:?}: {}", url, e)))?;

        Ok(url.to_string())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::resolve(
            self.access_token.as_deref(),
            self.api_key.as_deref(),
            self.username.as_deref(),
            self.password.as_deref(),
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
