//! Configuration management.
//!
//! Configuration is resolved once at startup (file, then environment, then
//! command-line flags) and passed explicitly to the builder and the backend.

use crate::error::{MonitoringError, Result};
use crate::names::ProjectName;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Metric type prefixes that mark a descriptor as user-defined.
pub const DEFAULT_USER_METRIC_PREFIXES: &[&str] =
    &["custom.googleapis.com/", "external.googleapis.com/"];

/// Default look-back window for reads without an explicit interval.
pub const DEFAULT_WINDOW_SECS: u64 = 20 * 60;

/// Persistent configuration for metricctl.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub project_id: Option<String>,
    pub endpoint: String,
    pub access_token: Option<String>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub default_window_secs: u64,
    pub page_size: i32,
    pub user_metric_prefixes: Vec<String>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_id: None,
            endpoint: "https://monitoring.googleapis.com".to_string(),
            access_token: None,
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            default_window_secs: DEFAULT_WINDOW_SECS,
            page_size: 500,
            user_metric_prefixes: DEFAULT_USER_METRIC_PREFIXES
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        paths::config_file()
    }

    /// Load configuration from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| MonitoringError::Io { path: path.to_path_buf(), source: e })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            MonitoringError::InvalidConfig { reason: format!("Failed to parse config: {}", e) }
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| MonitoringError::Io { path: parent.to_path_buf(), source: e })?;
        }
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            MonitoringError::InvalidConfig { reason: format!("Failed to serialize config: {}", e) }
        })?;
        std::fs::write(path, content)
            .map_err(|e| MonitoringError::Io { path: path.to_path_buf(), source: e })
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// `GCLOUD_PROJECT` wins over `GOOGLE_CLOUD_PROJECT`; empty values are ignored.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(project) = get("GCLOUD_PROJECT").or_else(|| get("GOOGLE_CLOUD_PROJECT")) {
            self.project_id = Some(project);
        }
        if let Some(endpoint) = get("METRICCTL_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Some(token) = get("METRICCTL_ACCESS_TOKEN") {
            self.access_token = Some(token);
        }
    }

    /// Check the values that cannot be caught by deserialization alone.
    pub fn validate(&self) -> Result<()> {
        let scheme_ok = ["http://", "https://", "unix:"]
            .iter()
            .any(|scheme| self.endpoint.starts_with(scheme));
        if !scheme_ok {
            return Err(MonitoringError::InvalidConfig {
                reason: format!(
                    "endpoint '{}' must start with http://, https:// or unix:",
                    self.endpoint
                ),
            });
        }
        if self.default_window_secs == 0 {
            return Err(MonitoringError::InvalidConfig {
                reason: "default_window_secs must be greater than zero".to_string(),
            });
        }
        if self.page_size <= 0 {
            return Err(MonitoringError::InvalidConfig {
                reason: "page_size must be greater than zero".to_string(),
            });
        }
        if self.user_metric_prefixes.is_empty() {
            return Err(MonitoringError::InvalidConfig {
                reason: "user_metric_prefixes must not be empty".to_string(),
            });
        }
        if self.user_metric_prefixes.iter().any(|p| p.trim().is_empty()) {
            return Err(MonitoringError::InvalidConfig {
                reason: "user_metric_prefixes must not contain an empty prefix".to_string(),
            });
        }
        Ok(())
    }

    /// Resolve the project scope, preferring an explicit override.
    pub fn project(&self, override_id: Option<&str>) -> Result<ProjectName> {
        match override_id.or(self.project_id.as_deref()) {
            Some(id) => ProjectName::parse(id),
            None => Err(MonitoringError::InvalidConfig {
                reason: "no project id: pass --project-id or set GCLOUD_PROJECT".to_string(),
            }),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn default_window(&self) -> Duration {
        Duration::from_secs(self.default_window_secs)
    }
}
