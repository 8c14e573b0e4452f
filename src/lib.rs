//! cockpit-sync: batch collection of flight simulator parameters
//!
//! This library wires the scheduler and live update machinery of
//! `cockpit-sync-core` into a runnable application:
//! - Configuration management
//! - A simulated simulator feed
//! - Animated faces driven by live update tasks

pub mod config;
pub mod faces;
pub mod sim;

// Re-export commonly used types
pub use config::{AppConfig, FeedConfig};
pub use faces::CollectionFace;
pub use sim::SimulatedFeed;
