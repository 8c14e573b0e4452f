//! Configuration management

mod defaults;
mod settings;

pub use defaults::{weather_batches, weather_scheduler, CLOUD_LAYERS, WIND_LAYERS};
pub use settings::{AppConfig, FeedConfig, CONFIG_VERSION};
