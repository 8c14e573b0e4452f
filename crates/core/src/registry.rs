//! Parameter registry interface
//!
//! The registry owns every parameter, its listeners and the set of
//! parameters the simulator is currently asked to monitor. Batches and
//! schedulers only add or remove monitoring interest and read timestamps.

use super::parameter::{ListenerId, Parameter, ParameterListener};
use chrono::{DateTime, Utc};
use cockpit_sync_types::ParameterValue;
use std::sync::Arc;
use thiserror::Error;

/// Errors reported by a parameter registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("invalid parameter path {0:?}")]
    InvalidPath(String),
    #[error("unknown parameter {0}")]
    UnknownParameter(String),
    #[error("monitoring capacity exceeded: {requested} new parameters requested, {available} slots available")]
    CapacityExceeded { requested: usize, available: usize },
}

/// Registry of simulator parameters
pub trait ParameterRegistry: Send + Sync {
    /// Return the parameter at `path`, creating it if needed
    fn get_or_create(&self, path: &str) -> Result<Parameter, RegistryError>;

    /// Current snapshot of an existing parameter
    fn get(&self, path: &str) -> Option<Parameter>;

    /// Attach a listener to an existing parameter
    fn add_listener(
        &self,
        path: &str,
        listener: Arc<dyn ParameterListener>,
    ) -> Result<ListenerId, RegistryError>;

    /// Detach a listener, returns false if it was not attached
    fn remove_listener(&self, path: &str, id: &str) -> bool;

    /// Ask the simulator to start sending updates for `paths`
    ///
    /// Either every path becomes monitored or none does.
    fn begin_monitoring(&self, paths: &[String]) -> Result<(), RegistryError>;

    /// Withdraw monitoring interest for `paths`
    fn end_monitoring(&self, paths: &[String]);

    /// Write a value, stamping the update time and notifying listeners
    fn write_value(&self, path: &str, value: ParameterValue) -> Result<(), RegistryError>;

    /// Whether the simulator is currently asked to send `path`
    fn is_monitored(&self, path: &str) -> bool;

    /// Number of distinct parameters currently monitored
    fn monitored_count(&self) -> usize;

    /// Current value of a parameter
    fn value(&self, path: &str) -> Option<ParameterValue> {
        self.get(path).and_then(|p| p.value)
    }

    /// When a parameter was last updated
    fn last_updated(&self, path: &str) -> Option<DateTime<Utc>> {
        self.get(path).and_then(|p| p.last_updated)
    }
}

/// Type-erased registry shared between components
pub type SharedRegistry = Arc<dyn ParameterRegistry>;
