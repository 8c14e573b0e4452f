//! cockpit-sync-types: Shared data types for cockpit-sync.
//!
//! This crate contains pure data types (parameter values, batch
//! declarations, scheduler and live update settings) that are shared across
//! all cockpit-sync crates. Nothing here touches threads or the parameter
//! registry, making these types suitable as a foundation layer.

pub mod batch;
pub mod live_update;
pub mod scheduler;
pub mod value;

// Re-export commonly used types at the crate root for convenience
pub use batch::{is_valid_path, BatchDeclaration, BatchSpec, ConfigError};
pub use live_update::LiveUpdateConfig;
pub use scheduler::{SchedulerConfig, DEFAULT_HEARTBEAT_PATH, INTERNAL_PATH_PREFIX};
pub use value::ParameterValue;
