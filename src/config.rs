//! Configuration Management
//!
//! Handles persistent configuration storage for konnect-sync. Effective values
//! resolve as CLI flag > environment > config file > default.

use crate::konnect::client::{region_base_url, DEFAULT_REGION};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const REGION_ENV: &str = "KONNECT_REGION";
pub const BASE_URL_ENV: &str = "KONNECT_BASE_URL";
pub const RUNTIME_GROUP_ENV: &str = "KONNECT_RUNTIME_GROUP_ID";

const DEFAULT_STATE_FILE: &str = "konnect-state.json";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Konnect region (`us`, `eu`, `au`, ...)
    #[serde(default)]
    pub region: Option<String>,
    /// Explicit API base URL, overrides the region
    #[serde(default)]
    pub base_url: Option<String>,
    /// Default runtime group for manifests that do not name one
    #[serde(default)]
    pub runtime_group_id: Option<String>,
    /// Where the local state file lives
    #[serde(default)]
    pub state_path: Option<PathBuf>,
    /// Per-request timeout
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("konnect-sync").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from `path`; missing or unreadable files yield defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        self.save_at(Self::config_path().as_deref())
    }

    fn save_at(&self, path: Option<&Path>) -> Result<()> {
        let path = path.context("No config directory found, cannot save configuration")?;
        self.save_to(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;

        Ok(())
    }

    /// Get effective region (env > config > default)
    pub fn effective_region(&self) -> String {
        env_value(REGION_ENV)
            .or_else(|| self.region.clone())
            .unwrap_or_else(|| DEFAULT_REGION.to_string())
    }

    /// Get effective base URL (env > config > derived from region)
    pub fn effective_base_url(&self) -> String {
        env_value(BASE_URL_ENV)
            .or_else(|| self.base_url.clone())
            .unwrap_or_else(|| region_base_url(&self.effective_region()))
    }

    /// Get effective runtime group (env > config)
    pub fn effective_runtime_group(&self) -> Option<String> {
        env_value(RUNTIME_GROUP_ENV).or_else(|| self.runtime_group_id.clone())
    }

    /// Get effective state file path (config > working directory default)
    pub fn effective_state_path(&self) -> PathBuf {
        self.state_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Set region and save
    pub fn set_region(&mut self, region: &str) -> Result<()> {
        self.region = Some(region.to_string());
        self.save()
    }

    /// Set default runtime group and save
    pub fn set_runtime_group(&mut self, runtime_group_id: &str) -> Result<()> {
        self.runtime_group_id = Some(runtime_group_id.to_string());
        self.save()
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.json"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            region: Some("eu".to_string()),
            runtime_group_id: Some("g1".to_string()),
            timeout_secs: Some(5),
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path);
        assert_eq!(loaded, config);
        assert_eq!(loaded.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_save_without_config_dir_fails() {
        let config = Config {
            region: Some("eu".to_string()),
            ..Config::default()
        };
        let err = config.save_at(None).unwrap_err();
        assert!(err.to_string().contains("No config directory"));
    }

    #[test]
    fn test_invalid_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn test_explicit_base_url_beats_region() {
        let config = Config {
            region: Some("eu".to_string()),
            base_url: Some("http://localhost:9000".to_string()),
            ..Config::default()
        };
        if std::env::var(BASE_URL_ENV).is_err() {
            assert_eq!(config.effective_base_url(), "http://localhost:9000");
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.effective_state_path(), PathBuf::from("konnect-state.json"));
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }
}
