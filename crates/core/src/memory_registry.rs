//! In-process parameter registry
//!
//! Holds every parameter in a map of individually locked entries so that an
//! update to one parameter never holds the collection lock. Listeners are
//! always invoked after every lock has been released, which lets them call
//! back into the registry (or into a scheduler that calls the registry).
//!
//! The monitored set models the simulator's subscription channel: it can be
//! bounded by a capacity, and interest is reference counted so overlapping
//! requests from several owners compose.

use super::clock::SharedClock;
use super::parameter::{new_listener_id, ListenerId, Parameter, ParameterListener};
use super::registry::{ParameterRegistry, RegistryError};
use cockpit_sync_types::{is_valid_path, ParameterValue};
use log::{debug, trace, warn};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, RwLock};

/// A parameter with its listeners
struct ParameterEntry {
    parameter: Parameter,
    listeners: Vec<(ListenerId, Arc<dyn ParameterListener>)>,
}

/// Thread-safe wrapper for ParameterEntry
type EntryHandle = Arc<Mutex<ParameterEntry>>;

/// Registry keeping all parameters in memory
pub struct InMemoryRegistry {
    /// Map from path to parameter handle
    parameters: RwLock<HashMap<String, EntryHandle>>,
    /// Monitored paths and how many owners asked for each
    monitored: Mutex<HashMap<String, usize>>,
    /// Maximum number of distinct monitored paths (None = unbounded)
    capacity: Option<usize>,
    clock: SharedClock,
}

impl InMemoryRegistry {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            parameters: RwLock::new(HashMap::new()),
            monitored: Mutex::new(HashMap::new()),
            capacity: None,
            clock,
        }
    }

    /// Registry whose monitoring channel holds at most `capacity` parameters
    pub fn with_capacity(clock: SharedClock, capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::new(clock)
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Deliver an update coming from the simulator.
    ///
    /// The simulator only sends what it was asked to monitor, so updates for
    /// unmonitored parameters are dropped. Returns true if delivered.
    pub fn deliver(&self, path: &str, value: ParameterValue) -> bool {
        if !self.is_monitored(path) {
            trace!("Dropping update for unmonitored parameter {}", path);
            return false;
        }
        match self.write_value(path, value) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to deliver update for {}: {}", path, e);
                false
            }
        }
    }

    /// Paths currently monitored, sorted
    pub fn monitored_paths(&self) -> Vec<String> {
        match self.monitored.lock() {
            Ok(monitored) => {
                let mut paths: Vec<String> = monitored.keys().cloned().collect();
                paths.sort();
                paths
            }
            Err(_) => Vec::new(),
        }
    }

    /// Number of registered parameters
    pub fn len(&self) -> usize {
        self.parameters.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn handle(&self, path: &str) -> Option<EntryHandle> {
        let parameters = self.parameters.read().ok()?;
        parameters.get(path).cloned()
    }

    fn get_or_create_handle(&self, path: &str) -> Result<EntryHandle, RegistryError> {
        if !is_valid_path(path) {
            return Err(RegistryError::InvalidPath(path.to_string()));
        }
        if let Some(handle) = self.handle(path) {
            return Ok(handle);
        }
        let mut parameters = self
            .parameters
            .write()
            .map_err(|_| RegistryError::UnknownParameter(path.to_string()))?;
        // Double-check after acquiring write lock (another thread may have inserted)
        let handle = parameters.entry(path.to_string()).or_insert_with(|| {
            debug!("Registered parameter {}", path);
            Arc::new(Mutex::new(ParameterEntry {
                parameter: Parameter::new(path),
                listeners: Vec::new(),
            }))
        });
        Ok(Arc::clone(handle))
    }
}

impl ParameterRegistry for InMemoryRegistry {
    fn get_or_create(&self, path: &str) -> Result<Parameter, RegistryError> {
        let handle = self.get_or_create_handle(path)?;
        let entry = handle
            .lock()
            .map_err(|_| RegistryError::UnknownParameter(path.to_string()))?;
        Ok(entry.parameter.clone())
    }

    fn get(&self, path: &str) -> Option<Parameter> {
        let handle = self.handle(path)?;
        let entry = handle.lock().ok()?;
        Some(entry.parameter.clone())
    }

    fn add_listener(
        &self,
        path: &str,
        listener: Arc<dyn ParameterListener>,
    ) -> Result<ListenerId, RegistryError> {
        let handle = self
            .handle(path)
            .ok_or_else(|| RegistryError::UnknownParameter(path.to_string()))?;
        let mut entry = handle
            .lock()
            .map_err(|_| RegistryError::UnknownParameter(path.to_string()))?;
        let id = new_listener_id();
        trace!("{} listens to {}", listener.name(), path);
        entry.listeners.push((id.clone(), listener));
        Ok(id)
    }

    fn remove_listener(&self, path: &str, id: &str) -> bool {
        let Some(handle) = self.handle(path) else {
            return false;
        };
        let Ok(mut entry) = handle.lock() else {
            return false;
        };
        let before = entry.listeners.len();
        entry.listeners.retain(|(lid, _)| lid != id);
        entry.listeners.len() != before
    }

    fn begin_monitoring(&self, paths: &[String]) -> Result<(), RegistryError> {
        let requested: BTreeSet<&String> = paths.iter().collect();
        if let Some(unknown) = requested.iter().find(|p| self.handle(p).is_none()) {
            return Err(RegistryError::UnknownParameter(unknown.to_string()));
        }

        let mut monitored = self.monitored.lock().unwrap_or_else(|e| e.into_inner());

        let new_paths = requested
            .iter()
            .filter(|p| !monitored.contains_key(p.as_str()))
            .count();
        if let Some(capacity) = self.capacity {
            let available = capacity.saturating_sub(monitored.len());
            if new_paths > available {
                return Err(RegistryError::CapacityExceeded {
                    requested: new_paths,
                    available,
                });
            }
        }

        for path in requested {
            *monitored.entry(path.clone()).or_insert(0) += 1;
        }
        debug!(
            "Monitoring {} new parameters ({} total)",
            new_paths,
            monitored.len()
        );
        Ok(())
    }

    fn end_monitoring(&self, paths: &[String]) {
        let Ok(mut monitored) = self.monitored.lock() else {
            return;
        };
        let requested: BTreeSet<&String> = paths.iter().collect();
        for path in requested {
            match monitored.get_mut(path.as_str()) {
                Some(count) if *count > 1 => *count -= 1,
                Some(_) => {
                    monitored.remove(path.as_str());
                }
                None => trace!("{} was not monitored", path),
            }
        }
        debug!("Monitoring {} parameters", monitored.len());
    }

    fn write_value(&self, path: &str, value: ParameterValue) -> Result<(), RegistryError> {
        let handle = self.get_or_create_handle(path)?;

        // Update under the entry lock, notify after releasing it
        let (snapshot, listeners) = {
            let mut entry = handle
                .lock()
                .map_err(|_| RegistryError::UnknownParameter(path.to_string()))?;
            entry.parameter.value = Some(value);
            entry.parameter.last_updated = Some(self.clock.now());
            let listeners: Vec<Arc<dyn ParameterListener>> =
                entry.listeners.iter().map(|(_, l)| Arc::clone(l)).collect();
            (entry.parameter.clone(), listeners)
        };

        for listener in listeners {
            listener.parameter_updated(&snapshot);
        }
        Ok(())
    }

    fn is_monitored(&self, path: &str) -> bool {
        self.monitored
            .lock()
            .map(|m| m.contains_key(path))
            .unwrap_or(false)
    }

    fn monitored_count(&self) -> usize {
        self.monitored.lock().map(|m| m.len()).unwrap_or(0)
    }
}
