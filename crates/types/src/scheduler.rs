//! Batch scheduler configuration

use crate::batch::BatchDeclaration;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Minute ticker of the simulator clock, used as the default heartbeat
pub const DEFAULT_HEARTBEAT_PATH: &str = "sim/cockpit2/clock_timer/zulu_time_minutes";

/// Prefix for parameters owned by cockpit-sync rather than the simulator
pub const INTERNAL_PATH_PREFIX: &str = "data:";

/// Per-instance configuration of one batch scheduler.
///
/// Every scheduler carries its own copy, so several schedulers of the same
/// kind never share windows or paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Scheduler name, used in logs and in the default notify path
    #[serde(default = "default_name")]
    pub name: String,

    /// Low-frequency parameter used only as a timing signal
    #[serde(default = "default_heartbeat_path")]
    pub heartbeat_path: String,

    /// Parameter receiving the cycle counter (None = `data:collector/<name>`)
    #[serde(default)]
    pub notify_path: Option<String>,

    /// Time a batch may stay loaded without completing before it is skipped
    #[serde(default = "default_stagnation_window_secs")]
    pub stagnation_window_secs: u64,

    /// Age after which a completed batch needs collecting again
    #[serde(default = "default_refresh_window_secs")]
    pub refresh_window_secs: u64,

    /// Pause after each monitoring request (0 = never block the caller)
    #[serde(default)]
    pub settle_ms: u64,

    /// Parameters kept per batch; larger batches are truncated
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Batches in visiting order
    #[serde(default)]
    pub batches: Vec<BatchDeclaration>,
}

fn default_name() -> String {
    "collector".to_string()
}

fn default_heartbeat_path() -> String {
    DEFAULT_HEARTBEAT_PATH.to_string()
}

fn default_stagnation_window_secs() -> u64 {
    10
}

fn default_refresh_window_secs() -> u64 {
    600
}

fn default_max_batch_size() -> usize {
    40
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            heartbeat_path: default_heartbeat_path(),
            notify_path: None,
            stagnation_window_secs: default_stagnation_window_secs(),
            refresh_window_secs: default_refresh_window_secs(),
            settle_ms: 0,
            max_batch_size: default_max_batch_size(),
            batches: Vec::new(),
        }
    }
}

impl SchedulerConfig {
    /// Path the completion counter is written to
    pub fn notify_path(&self) -> String {
        self.notify_path
            .clone()
            .unwrap_or_else(|| format!("{}collector/{}", INTERNAL_PATH_PREFIX, self.name))
    }

    pub fn stagnation_window(&self) -> Duration {
        Duration::from_secs(self.stagnation_window_secs)
    }

    pub fn refresh_window(&self) -> Duration {
        Duration::from_secs(self.refresh_window_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config: SchedulerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SchedulerConfig::default());
        assert_eq!(config.stagnation_window(), Duration::from_secs(10));
        assert_eq!(config.refresh_window(), Duration::from_secs(600));
        assert_eq!(config.settle(), Duration::ZERO);
        assert_eq!(config.max_batch_size, 40);
    }

    #[test]
    fn test_notify_path() {
        let mut config = SchedulerConfig {
            name: "weather".to_string(),
            ..Default::default()
        };
        assert_eq!(config.notify_path(), "data:collector/weather");

        config.notify_path = Some("data:wx-done".to_string());
        assert_eq!(config.notify_path(), "data:wx-done");
    }
}
