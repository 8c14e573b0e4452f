//! Batch of parameters collected together
//!
//! A batch is loaded (monitored) as a unit. It is "collected" once every
//! one of its parameters has reported an update since the batch was last
//! loaded.

use super::clock::{elapsed_since, to_time_delta, SharedClock};
use super::parameter::{ListenerId, ParameterListener};
use super::registry::{RegistryError, SharedRegistry};
use chrono::{DateTime, Utc};
use cockpit_sync_types::{is_valid_path, BatchSpec, ParameterValue};
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Default time a loaded batch may go without completing
pub const DEFAULT_STAGNATION_WINDOW: Duration = Duration::from_secs(10);

/// Default age after which a completed batch needs collecting again
pub const DEFAULT_REFRESH_WINDOW: Duration = Duration::from_secs(600);

/// How far along a batch is, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BatchStatus {
    /// Parameters in the batch
    pub count: usize,
    /// Parameters holding a value
    pub filled: usize,
    /// Parameters that never received an update
    pub never_updated: usize,
    /// Parameters last updated before the batch was loaded
    pub expired: usize,
}

/// A named group of parameters monitored as one unit
pub struct Batch {
    name: String,
    parameters: Vec<String>,
    registry: SharedRegistry,
    clock: SharedClock,
    settle: Duration,
    loaded: bool,
    last_loaded: Option<DateTime<Utc>>,
    last_unloaded: Option<DateTime<Utc>>,
    last_completed: Option<DateTime<Utc>>,
}

impl Batch {
    /// Build a batch from its expanded declaration.
    ///
    /// Invalid paths are dropped and batches above `max_size` are truncated,
    /// both with a warning. A batch left without parameters is inert: it
    /// never collects and is only ever skipped.
    pub fn new(
        spec: BatchSpec,
        max_size: usize,
        registry: SharedRegistry,
        clock: SharedClock,
    ) -> Self {
        let BatchSpec { name, parameters } = spec;
        let mut parameters: Vec<String> = parameters
            .into_iter()
            .filter(|path| {
                let valid = is_valid_path(path);
                if !valid {
                    warn!("batch {}: ignoring invalid parameter path {:?}", name, path);
                }
                valid
            })
            .collect();
        if parameters.len() > max_size {
            warn!(
                "batch {}: larger than {} parameters, *** not all parameters will be collected ***",
                name, max_size
            );
            parameters.truncate(max_size);
        }
        if parameters.is_empty() {
            warn!("batch {}: no parameters, batch will never be collected", name);
        }
        Self {
            name,
            parameters,
            registry,
            clock,
            settle: Duration::ZERO,
            loaded: false,
            last_loaded: None,
            last_unloaded: None,
            last_completed: None,
        }
    }

    /// Pause after each monitoring request
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Register every parameter with the registry and attach `listener`
    pub fn init(
        &self,
        listener: Arc<dyn ParameterListener>,
    ) -> Result<Vec<ListenerId>, RegistryError> {
        let mut ids = Vec::with_capacity(self.parameters.len());
        for path in &self.parameters {
            self.registry.get_or_create(path)?;
            ids.push(self.registry.add_listener(path, Arc::clone(&listener))?);
        }
        debug!("batch {}: {} parameters registered", self.name, ids.len());
        Ok(ids)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn contains(&self, path: &str) -> bool {
        self.parameters.iter().any(|p| p == path)
    }

    /// A batch without parameters can never be collected
    pub fn is_inert(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn last_loaded(&self) -> Option<DateTime<Utc>> {
        self.last_loaded
    }

    pub fn last_unloaded(&self) -> Option<DateTime<Utc>> {
        self.last_unloaded
    }

    pub fn last_completed(&self) -> Option<DateTime<Utc>> {
        self.last_completed
    }

    /// True when the batch was loaded and every parameter updated since
    pub fn is_collected(&self) -> bool {
        let Some(loaded) = self.last_loaded else {
            return false;
        };
        if self.is_inert() {
            return false;
        }
        self.parameters.iter().all(|path| {
            self.registry
                .get(path)
                .map(|p| p.updated_since(loaded))
                .unwrap_or(false)
        })
    }

    /// Mark the batch as collected now
    pub fn collected(&mut self) {
        self.last_completed = Some(self.clock.now());
        debug!("batch {} collected", self.name);
    }

    /// Mark the batch for reactivation.
    ///
    /// Clears `last_loaded` when forced, or when the batch was last completed
    /// before `threshold` (a batch never completed counts as older than any
    /// threshold).
    pub fn collect(&mut self, threshold: Option<DateTime<Utc>>, force: bool) {
        let stale = match (threshold, self.last_completed) {
            (Some(threshold), Some(completed)) => completed < threshold,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if force || stale {
            self.last_loaded = None;
            debug!("batch {} ready to collect", self.name);
        }
    }

    /// True when the batch has been loaded for longer than `window`
    pub fn did_not_progress(&self, window: Duration) -> bool {
        let stalled = match self.last_loaded {
            Some(loaded) => elapsed_since(self.clock.as_ref(), loaded) > window,
            None => false,
        };
        if stalled {
            debug!(
                "batch {} did not progress for {} seconds",
                self.name,
                window.as_secs_f64()
            );
        }
        stalled
    }

    /// True when the batch was never completed or completed more than `window` ago
    pub fn need_refresh(&self, window: Duration) -> bool {
        match self.last_completed {
            Some(completed) => completed < self.clock.now() - to_time_delta(window),
            None => true,
        }
    }

    /// Start monitoring the batch's parameters
    pub fn load(&mut self) {
        self.last_loaded = Some(self.clock.now());
        match self.registry.begin_monitoring(&self.parameters) {
            Ok(()) => {
                self.loaded = true;
                info!("batch {} loaded", self.name);
            }
            // Left to stagnate: the scheduler skips it after the window
            Err(e) => warn!("batch {}: could not start monitoring: {}", self.name, e),
        }
        debug!("batch {}: {:?}", self.name, self.status());
        self.pace();
    }

    /// Stop monitoring the batch's parameters
    pub fn unload(&mut self) {
        if self.loaded {
            self.registry.end_monitoring(&self.parameters);
            self.loaded = false;
        }
        self.last_unloaded = Some(self.clock.now());
        debug!("batch {} unloaded: {:?}", self.name, self.status());
        self.pace();
    }

    fn pace(&self) {
        if !self.settle.is_zero() {
            std::thread::sleep(self.settle);
        }
    }

    /// Count parameters by freshness
    pub fn status(&self) -> BatchStatus {
        let mut status = BatchStatus {
            count: self.parameters.len(),
            ..Default::default()
        };
        for path in &self.parameters {
            let Some(parameter) = self.registry.get(path) else {
                status.never_updated += 1;
                continue;
            };
            if parameter.value.is_some() {
                status.filled += 1;
            }
            match (parameter.last_updated, self.last_loaded) {
                (None, _) => status.never_updated += 1,
                (Some(updated), Some(loaded)) if updated < loaded => status.expired += 1,
                _ => {}
            }
        }
        status
    }

    /// Current values in declaration order
    pub fn values(&self) -> Vec<Option<ParameterValue>> {
        self.parameters
            .iter()
            .map(|path| self.registry.value(path))
            .collect()
    }

    /// Value of one parameter of the batch
    pub fn value(&self, path: &str) -> Option<ParameterValue> {
        if !self.contains(path) {
            warn!("batch {}: parameter {} not found", self.name, path);
            return None;
        }
        self.registry.value(path)
    }

    /// Decode a batch of character codes into text.
    ///
    /// Zero becomes a space; codes outside 1..=255 and missing values are
    /// skipped.
    pub fn as_text(&self) -> String {
        self.values()
            .into_iter()
            .flatten()
            .filter_map(|v| v.as_i64())
            .filter_map(|code| match code {
                0 => Some(' '),
                1..=255 => char::from_u32(code as u32),
                _ => {
                    debug!("batch {}: invalid char value {}", self.name, code);
                    None
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for Batch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Batch")
            .field("name", &self.name)
            .field("parameters", &self.parameters.len())
            .field("loaded", &self.loaded)
            .field("last_loaded", &self.last_loaded)
            .field("last_unloaded", &self.last_unloaded)
            .field("last_completed", &self.last_completed)
            .finish()
    }
}
