use anyhow::{Context, Result};
use clap::Parser;
use cockpit_sync::{AppConfig, CollectionFace, SimulatedFeed};
use cockpit_sync_core::{
    BatchScheduler, InMemoryRegistry, LiveUpdateTask, ParameterRegistry, SharedRegistry,
    StopOutcome, SystemClock,
};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// cockpit-sync - round-robin batch collection of simulator parameters
#[derive(Parser, Debug, Clone)]
#[command(name = "cockpit-sync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Debug verbosity level (0=quiet, 1=info, 2=debug, 3=trace)
    #[arg(short = 'd', long = "debug", value_name = "LEVEL", default_value = "0")]
    debug: u8,

    /// Heartbeat period of the simulated feed in milliseconds
    #[arg(long = "heartbeat-ms", value_name = "MS")]
    heartbeat_ms: Option<u64>,

    /// Monitoring channel capacity (0 = unbounded)
    #[arg(long = "capacity", value_name = "N")]
    capacity: Option<usize>,

    /// Stop after this many seconds (Ctrl-C stops earlier)
    #[arg(long = "run-secs", value_name = "SECS", default_value = "30")]
    run_secs: u64,

    /// Parameters the simulated feed never sends
    #[arg(long = "unsupported", value_name = "PATH", num_args = 1..)]
    unsupported: Vec<String>,

    /// Print the default configuration as JSON and exit
    #[arg(long = "print-default-config")]
    print_default_config: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Level 0 (default): warn only
    // Level 1: info
    // Level 2: debug
    // Level 3+: trace
    let log_level = match cli.debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // Allow RUST_LOG to override CLI setting
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if cli.print_default_config {
        println!("{}", serde_json::to_string_pretty(&AppConfig::default())?);
        return Ok(());
    }

    warn!("Starting cockpit-sync v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;
    run(config, Duration::from_secs(cli.run_secs))
}

/// Load the configuration file and apply command line overrides
fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load().context("loading configuration")?,
    };

    if let Some(heartbeat_ms) = cli.heartbeat_ms {
        config.feed.heartbeat_ms = heartbeat_ms;
    }
    if let Some(capacity) = cli.capacity {
        config.feed.capacity = (capacity > 0).then_some(capacity);
    }
    config.feed.unsupported.extend(cli.unsupported.iter().cloned());
    Ok(config)
}

fn run(config: AppConfig, run_for: Duration) -> Result<()> {
    let clock = SystemClock::shared();
    let registry = Arc::new(match config.feed.capacity {
        Some(capacity) => InMemoryRegistry::with_capacity(Arc::clone(&clock), capacity),
        None => InMemoryRegistry::new(Arc::clone(&clock)),
    });
    let shared: SharedRegistry = registry.clone();

    let scheduler = BatchScheduler::new(config.scheduler.clone(), Arc::clone(&shared), clock)
        .context("creating scheduler")?
        .install()
        .context("installing scheduler")?;
    let heartbeat_path = {
        let guard = scheduler.lock().unwrap_or_else(|e| e.into_inner());
        info!(
            "{}: {} batches, heartbeat {}, notify {}",
            guard.name(),
            guard.batches().len(),
            guard.heartbeat_path(),
            guard.notify_path()
        );
        guard.heartbeat_path().to_string()
    };

    let mut face = LiveUpdateTask::new(CollectionFace::new(&scheduler, shared), config.face);
    face.sync();

    let runtime = tokio::runtime::Runtime::new().context("starting runtime")?;
    let feed = runtime.block_on(async {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let feed = SimulatedFeed::new(registry.clone(), heartbeat_path, config.feed.clone());
        let handle = tokio::spawn(feed.run(shutdown_rx));

        tokio::select! {
            _ = tokio::time::sleep(run_for) => info!("Run time elapsed"),
            _ = tokio::signal::ctrl_c() => info!("Interrupted"),
        }
        let _ = shutdown_tx.send(true);
        handle.await
    })?;

    if face.stop() == StopOutcome::Abandoned {
        warn!("{}: face worker may hang", face.name());
    }
    face.render_now();

    let summary = {
        let guard = scheduler.lock().unwrap_or_else(|e| e.into_inner());
        let batches: Vec<_> = guard
            .batches()
            .iter()
            .map(|b| {
                serde_json::json!({
                    "name": b.name(),
                    "collected": b.is_collected(),
                    "last_completed": b.last_completed(),
                    "status": b.status(),
                })
            })
            .collect();
        serde_json::json!({
            "scheduler": guard.name(),
            "finished_at": chrono::Utc::now(),
            "state": guard.state(),
            "last_notified": guard.last_notified(),
            "notified": registry.value(guard.notify_path()),
            "delivered": feed.delivered(),
            "monitored": registry.monitored_paths(),
            "batches": batches,
        })
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
