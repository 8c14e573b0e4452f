//! Built-in weather collector
//!
//! The simulator's weather model exposes far more parameters than the
//! monitoring channel accepts at once, so the default configuration splits
//! it into one general batch, one batch per cloud layer and one per wind
//! layer.

use cockpit_sync_types::{BatchDeclaration, SchedulerConfig};

/// Number of cloud layers in the weather model
pub const CLOUD_LAYERS: usize = 3;

/// Number of wind layers in the weather model
pub const WIND_LAYERS: usize = 13;

const WEATHER: &[&str] = &[
    "sim/weather/aircraft/altimeter_temperature_error",
    "sim/weather/aircraft/barometer_current_pas",
    "sim/weather/aircraft/gravity_mss",
    "sim/weather/aircraft/precipitation_on_aircraft_ratio",
    "sim/weather/aircraft/qnh_pas",
    "sim/weather/aircraft/relative_humidity_sealevel_percent",
    "sim/weather/aircraft/speed_sound_ms",
    "sim/weather/aircraft/temperature_ambient_deg_c",
    "sim/weather/aircraft/temperature_leadingedge_deg_c",
    "sim/weather/aircraft/thermal_rate_ms",
    "sim/weather/aircraft/visibility_reported_sm",
    "sim/weather/aircraft/wave_amplitude",
    "sim/weather/aircraft/wave_dir",
    "sim/weather/aircraft/wave_length",
    "sim/weather/aircraft/wave_speed",
    "sim/weather/aircraft/wind_now_x_msc",
    "sim/weather/aircraft/wind_now_y_msc",
    "sim/weather/aircraft/wind_now_z_msc",
    "sim/weather/aircraft/wind_speed_msc",
];

const CLOUD: &[&str] = &[
    "sim/weather/aircraft/cloud_base_msl_m",
    "sim/weather/aircraft/cloud_coverage_percent",
    "sim/weather/aircraft/cloud_tops_msl_m",
    "sim/weather/aircraft/cloud_type",
];

const WIND: &[&str] = &[
    "sim/weather/aircraft/dewpoint_deg_c",
    "sim/weather/aircraft/shear_direction_degt",
    "sim/weather/aircraft/shear_speed_kts",
    "sim/weather/aircraft/temperatures_aloft_deg_c",
    "sim/weather/aircraft/turbulence",
    "sim/weather/aircraft/wind_altitude_msl_m",
    "sim/weather/aircraft/wind_direction_degt",
    "sim/weather/aircraft/wind_speed_kts",
];

fn paths(list: &[&str]) -> Vec<String> {
    list.iter().map(|p| p.to_string()).collect()
}

/// Batch declarations of the weather collector
pub fn weather_batches() -> Vec<BatchDeclaration> {
    vec![
        BatchDeclaration::new("weather", paths(WEATHER)),
        BatchDeclaration::array("cloud", paths(CLOUD), CLOUD_LAYERS),
        BatchDeclaration::array("wind", paths(WIND), WIND_LAYERS),
    ]
}

/// Scheduler configuration of the weather collector
pub fn weather_scheduler() -> SchedulerConfig {
    SchedulerConfig {
        name: "weather".to_string(),
        batches: weather_batches(),
        ..SchedulerConfig::default()
    }
}
