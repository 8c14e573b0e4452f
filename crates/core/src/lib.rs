//! cockpit-sync-core: batch polling scheduler and live update workers.
//!
//! This crate contains the parameter registry abstraction with an in-memory
//! implementation, the `Batch` collection unit, the `BatchScheduler` that
//! rotates batches through a capacity-limited monitoring channel, and the
//! `LiveUpdateTask` periodic worker.

mod batch;
pub mod clock;
mod live_update;
mod memory_registry;
mod parameter;
mod registry;
pub mod scheduler;

pub use batch::{Batch, BatchStatus, DEFAULT_REFRESH_WINDOW, DEFAULT_STAGNATION_WINDOW};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use live_update::{LiveUpdate, LiveUpdateTask, StopOutcome};
pub use memory_registry::InMemoryRegistry;
pub use parameter::{ListenerId, Parameter, ParameterListener};
pub use registry::{ParameterRegistry, RegistryError, SharedRegistry};
pub use scheduler::{BatchScheduler, SchedulerError, SchedulerEvent, SchedulerState};

// Re-export configuration types used in constructor signatures
pub use cockpit_sync_types::{
    BatchDeclaration, BatchSpec, LiveUpdateConfig, ParameterValue, SchedulerConfig,
};
