//! Configuration file for threadscan

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "threadscan.toml";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Path to the SQLite database
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Remote source settings
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Ingestion settings
    #[serde(default)]
    pub ingest: IngestSettings,
}

/// Remote source configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the JSON API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Number of recent posts fetched per pass
    #[serde(default = "default_post_limit")]
    pub post_limit: usize,
}

/// Ingestion engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestSettings {
    /// Placeholder resolutions allowed per post
    #[serde(default = "default_max_resolutions")]
    pub max_resolutions: usize,

    /// Store the live comment count after revisiting a known post
    #[serde(default = "default_refresh_comment_counts")]
    pub refresh_comment_counts: bool,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("threadscan.db")
}

fn default_base_url() -> String {
    "https://www.reddit.com".to_string()
}

fn default_user_agent() -> String {
    format!("{}/{}", crate::APP_NAME, crate::VERSION)
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_post_limit() -> usize {
    100
}

fn default_max_resolutions() -> usize {
    1000
}

fn default_refresh_comment_counts() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            remote: RemoteConfig::default(),
            ingest: IngestSettings::default(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
            post_limit: default_post_limit(),
        }
    }
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            max_resolutions: default_max_resolutions(),
            refresh_comment_counts: default_refresh_comment_counts(),
        }
    }
}

impl Config {
    /// Load configuration from `path` or return defaults if it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.database_path, PathBuf::from("threadscan.db"));
        assert_eq!(config.remote.post_limit, 100);
        assert!(config.remote.user_agent.starts_with("threadscan/"));
        assert!(config.ingest.refresh_comment_counts);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            database_path = "/tmp/x.db"

            [ingest]
            refresh_comment_counts = false
            "#,
        )
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/tmp/x.db"));
        assert!(!config.ingest.refresh_comment_counts);
        assert_eq!(config.ingest.max_resolutions, 1000);
        assert_eq!(config.remote, RemoteConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(DEFAULT_CONFIG_FILE);

        let mut config = Config::default();
        config.remote.post_limit = 25;
        config.save(&path).unwrap();

        let loaded = Config::load_or_default(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded, Config::default());
    }
}
