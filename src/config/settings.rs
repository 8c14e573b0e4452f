//! Application configuration

use anyhow::{Context, Result};
use cockpit_sync_types::{LiveUpdateConfig, SchedulerConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::defaults::weather_scheduler;

/// Current config format version
pub const CONFIG_VERSION: u32 = 1;

/// Application-wide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the config format
    #[serde(default = "default_version")]
    pub version: u32,
    /// Collector to run
    #[serde(default = "weather_scheduler")]
    pub scheduler: SchedulerConfig,
    /// Refresh settings of the collection face
    #[serde(default = "default_face")]
    pub face: LiveUpdateConfig,
    /// Simulated simulator
    #[serde(default)]
    pub feed: FeedConfig,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_face() -> LiveUpdateConfig {
    LiveUpdateConfig {
        interval_ms: 250,
        ..LiveUpdateConfig::default()
    }
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults when absent
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        Self::load_from_path(&config_path)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to_path(&config_path)
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("org", "cockpit-sync", "cockpit-sync")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(dirs.config_dir().join("config.json"))
    }

    /// Load configuration from a specific file path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to a specific file path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            scheduler: weather_scheduler(),
            face: default_face(),
            feed: FeedConfig::default(),
        }
    }
}

/// Simulated simulator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Period of the heartbeat parameter
    #[serde(default = "default_heartbeat_ms")]
    pub heartbeat_ms: u64,
    /// Period at which monitored parameters receive fresh values
    #[serde(default = "default_value_ms")]
    pub value_ms: u64,
    /// Monitoring channel capacity (None = unbounded)
    #[serde(default = "default_capacity")]
    pub capacity: Option<usize>,
    /// Parameters the simulator never sends
    #[serde(default)]
    pub unsupported: Vec<String>,
}

fn default_heartbeat_ms() -> u64 {
    1000
}

fn default_value_ms() -> u64 {
    200
}

fn default_capacity() -> Option<usize> {
    Some(40)
}

impl FeedConfig {
    pub fn heartbeat(&self) -> Duration {
        Duration::from_millis(self.heartbeat_ms.max(1))
    }

    pub fn value_period(&self) -> Duration {
        Duration::from_millis(self.value_ms.max(1))
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            heartbeat_ms: default_heartbeat_ms(),
            value_ms: default_value_ms(),
            capacity: default_capacity(),
            unsupported: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = AppConfig::default();
        config.feed.unsupported.push("sim/weather/aircraft/wave_dir".to_string());
        config.scheduler.stagnation_window_secs = 4;
        config.save_to_path(&path).unwrap();

        let loaded = AppConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "scheduler": { "name": "radios", "batches": [
                 { "name": "com", "datarefs": ["sim/cockpit2/radios/actuators/com1_frequency_hz_833"] }
               ] },
               "feed": { "capacity": null } }"#,
        )
        .unwrap();

        let config = AppConfig::load_from_path(&path).unwrap();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.scheduler.name, "radios");
        assert_eq!(config.scheduler.notify_path(), "data:collector/radios");
        assert_eq!(config.scheduler.batches.len(), 1);
        assert_eq!(config.feed.capacity, None);
        assert_eq!(config.feed.heartbeat_ms, 1000);
        assert_eq!(config.face.interval_ms, 250);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = AppConfig::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("parsing"));
    }

    #[test]
    fn test_default_collects_weather() {
        let config = AppConfig::default();
        assert_eq!(config.scheduler.name, "weather");
        assert_eq!(config.scheduler.batches.len(), 3);
        assert_eq!(config.feed.heartbeat(), Duration::from_secs(1));
    }
}
