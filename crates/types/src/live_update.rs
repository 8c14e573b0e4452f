//! Live update task settings

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tick interval and stop timeout of a live update task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveUpdateConfig {
    /// Time between two update/render ticks
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Lower bound of the stop timeout, which is otherwise twice the interval
    #[serde(default = "default_join_floor_ms")]
    pub join_floor_ms: u64,
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_join_floor_ms() -> u64 {
    5000
}

impl Default for LiveUpdateConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            join_floor_ms: default_join_floor_ms(),
        }
    }
}

impl LiveUpdateConfig {
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval_ms: interval.as_millis() as u64,
            ..Default::default()
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// How long `stop()` waits for the worker: `max(2 × interval, floor)`
    pub fn join_timeout(&self) -> Duration {
        (self.interval() * 2).max(Duration::from_millis(self.join_floor_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_timeout_is_clamped_to_floor() {
        let config = LiveUpdateConfig::with_interval(Duration::from_millis(100));
        assert_eq!(config.join_timeout(), Duration::from_secs(5));

        let slow = LiveUpdateConfig::with_interval(Duration::from_secs(4));
        assert_eq!(slow.join_timeout(), Duration::from_secs(8));
    }
}
