//! Simulated simulator feed
//!
//! Stands in for the network link to the flight simulator: it ticks the
//! heartbeat parameter and, for every parameter currently monitored, sends a
//! fresh value. Like the real simulator it only sends what it was asked to
//! monitor, and it silently never sends parameters it does not support.

use crate::config::FeedConfig;
use cockpit_sync_core::{InMemoryRegistry, ParameterRegistry, ParameterValue};
use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;

/// Drives an `InMemoryRegistry` as if a simulator were connected
pub struct SimulatedFeed {
    registry: Arc<InMemoryRegistry>,
    heartbeat_path: String,
    config: FeedConfig,
    unsupported: HashSet<String>,
    /// Simulator zulu minutes, sent as the heartbeat value
    minutes: i64,
    rng: StdRng,
    delivered: u64,
}

impl SimulatedFeed {
    pub fn new(registry: Arc<InMemoryRegistry>, heartbeat_path: impl Into<String>, config: FeedConfig) -> Self {
        Self::with_rng(registry, heartbeat_path, config, StdRng::from_entropy())
    }

    /// Feed with a seeded value generator
    pub fn seeded(
        registry: Arc<InMemoryRegistry>,
        heartbeat_path: impl Into<String>,
        config: FeedConfig,
        seed: u64,
    ) -> Self {
        Self::with_rng(registry, heartbeat_path, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        registry: Arc<InMemoryRegistry>,
        heartbeat_path: impl Into<String>,
        config: FeedConfig,
        rng: StdRng,
    ) -> Self {
        let unsupported = config.unsupported.iter().cloned().collect();
        Self {
            registry,
            heartbeat_path: heartbeat_path.into(),
            config,
            unsupported,
            minutes: 0,
            rng,
            delivered: 0,
        }
    }

    /// Total values delivered to monitored parameters
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Advance the simulator clock by one minute and send the heartbeat.
    ///
    /// Like any other parameter, the heartbeat only arrives while it is
    /// monitored. Returns true if it was delivered.
    pub fn beat(&mut self) -> bool {
        self.minutes = (self.minutes + 1) % 60;
        let delivered = self
            .registry
            .deliver(&self.heartbeat_path, ParameterValue::from(self.minutes));
        if delivered {
            trace!("Heartbeat {} = {}", self.heartbeat_path, self.minutes);
        } else {
            warn!("Heartbeat {} is not monitored", self.heartbeat_path);
        }
        delivered
    }

    /// Send a fresh value for every monitored, supported parameter.
    ///
    /// Returns the number of values delivered.
    pub fn send_values(&mut self) -> usize {
        let mut sent = 0;
        for path in self.registry.monitored_paths() {
            if path == self.heartbeat_path || self.unsupported.contains(&path) {
                continue;
            }
            let value: f64 = self.rng.gen_range(-50.0..50.0);
            if self.registry.deliver(&path, ParameterValue::from(value)) {
                sent += 1;
            }
        }
        self.delivered += sent as u64;
        sent
    }

    /// Run until `shutdown` turns true or its sender is dropped
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Self {
        let mut heartbeat = tokio::time::interval(self.config.heartbeat());
        let mut values = tokio::time::interval(self.config.value_period());
        info!(
            "Simulated feed started (heartbeat {:?}, values {:?}, {} unsupported)",
            self.config.heartbeat(),
            self.config.value_period(),
            self.unsupported.len()
        );

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    self.beat();
                }
                _ = values.tick() => {
                    let sent = self.send_values();
                    if sent > 0 {
                        trace!("Delivered {} values", sent);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        debug!("Simulated feed stopped after {} values", self.delivered);
        self
    }
}
