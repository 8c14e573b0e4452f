//! Parameter type and listener trait

use chrono::{DateTime, Utc};
use cockpit_sync_types::ParameterValue;
use uuid::Uuid;

/// Snapshot of a simulator parameter ("dataref")
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Parameter path, e.g. `sim/weather/aircraft/qnh_pas`
    pub path: String,
    /// Last value received, None until the first update
    pub value: Option<ParameterValue>,
    /// When the last update arrived, changed or not
    pub last_updated: Option<DateTime<Utc>>,
}

impl Parameter {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            value: None,
            last_updated: None,
        }
    }

    /// True if the parameter received an update at or after `since`
    pub fn updated_since(&self, since: DateTime<Utc>) -> bool {
        matches!(self.last_updated, Some(updated) if updated >= since)
    }
}

/// Identifies a registered listener so it can be removed later
pub type ListenerId = String;

pub(crate) fn new_listener_id() -> ListenerId {
    Uuid::new_v4().to_string()
}

/// Trait for everything that wants to hear about parameter updates
///
/// Listeners are called from whatever thread delivers the update, after the
/// registry has released its own locks. They must return promptly.
pub trait ParameterListener: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str {
        "unnamed"
    }

    /// Called each time a parameter the listener is attached to is updated
    fn parameter_updated(&self, parameter: &Parameter);
}
