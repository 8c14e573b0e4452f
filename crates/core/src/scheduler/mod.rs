//! Batch scheduler
//!
//! Collects more parameters than the simulator's monitoring channel can hold
//! at once by visiting batches round-robin. Only one batch is monitored at a
//! time; a batch that completes or stagnates is swapped for the next one,
//! and a counter is written to the notify parameter once every batch has
//! been collected.
//!
//! The scheduler owns no thread. It is driven by parameter callbacks
//! (serialized by the caller) and never blocks unless a settle pause is
//! configured.

mod machine;

pub use machine::{transition, BatchView, Effect, SchedulerEvent, SchedulerState, Transition};

use super::batch::Batch;
use super::clock::{to_time_delta, SharedClock};
use super::parameter::{Parameter, ParameterListener};
use super::registry::{RegistryError, SharedRegistry};
use chrono::{DateTime, Utc};
use cockpit_sync_types::SchedulerConfig;
use log::{debug, info, trace, warn};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use thiserror::Error;

/// Configuration-time scheduler failures
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("scheduler {scheduler}: registration failed: {source}")]
    Registration {
        scheduler: String,
        #[source]
        source: RegistryError,
    },
    #[error("scheduler {scheduler}: notify path {path} is also listened to")]
    NotifyPathConflict { scheduler: String, path: String },
}

/// Round-robin collector of parameter batches
pub struct BatchScheduler {
    name: String,
    heartbeat_path: String,
    notify_path: String,
    stagnation_window: Duration,
    refresh_window: Duration,
    batches: Vec<Batch>,
    state: SchedulerState,
    last_notified: Option<DateTime<Utc>>,
    /// Whether `install` obtained monitoring for the heartbeat
    heartbeat_monitored: bool,
    registry: SharedRegistry,
    clock: SharedClock,
}

impl BatchScheduler {
    /// Build a scheduler from its configuration.
    ///
    /// Batch declarations are expanded here; misconfigured ones are logged
    /// and kept as inert batches. The heartbeat and notify parameters are
    /// created in the registry.
    pub fn new(
        config: SchedulerConfig,
        registry: SharedRegistry,
        clock: SharedClock,
    ) -> Result<Self, SchedulerError> {
        let name = config.name.clone();
        let notify_path = config.notify_path();
        let registration = |source| SchedulerError::Registration {
            scheduler: name.clone(),
            source,
        };

        let mut batches = Vec::new();
        for declaration in &config.batches {
            if let Err(e) = declaration.validate() {
                warn!("{}: {}", name, e);
            }
            for spec in declaration.expand() {
                batches.push(
                    Batch::new(spec, config.max_batch_size, Arc::clone(&registry), Arc::clone(&clock))
                        .with_settle(config.settle()),
                );
            }
        }
        if batches.is_empty() {
            warn!("{}: no batches configured, nothing will be collected", name);
        }

        if notify_path == config.heartbeat_path || batches.iter().any(|b| b.contains(&notify_path)) {
            return Err(SchedulerError::NotifyPathConflict {
                scheduler: name.clone(),
                path: notify_path,
            });
        }
        if batches.iter().any(|b| b.contains(&config.heartbeat_path)) {
            warn!(
                "{}: heartbeat {} is also a batch parameter, it will only act as heartbeat",
                name, config.heartbeat_path
            );
        }

        registry.get_or_create(&config.heartbeat_path).map_err(registration)?;
        registry.get_or_create(&notify_path).map_err(registration)?;

        let parameter_count: usize = batches.iter().map(|b| b.parameters().len()).sum();
        debug!(
            "{}: {} batches, {} parameters, notifying {}",
            name,
            batches.len(),
            parameter_count,
            notify_path
        );

        Ok(Self {
            name,
            heartbeat_path: config.heartbeat_path.clone(),
            notify_path,
            stagnation_window: config.stagnation_window(),
            refresh_window: config.refresh_window(),
            batches,
            state: SchedulerState::default(),
            last_notified: None,
            heartbeat_monitored: false,
            registry,
            clock,
        })
    }

    /// Attach the scheduler to the registry.
    ///
    /// Every batch parameter and the heartbeat get a listener forwarding
    /// updates to `dataref_changed`. The listener only holds a weak
    /// reference, so dropping the returned handle silences it.
    ///
    /// The heartbeat stays monitored for the scheduler's lifetime and takes
    /// one slot of the monitoring channel.
    pub fn install(self) -> Result<Arc<Mutex<Self>>, SchedulerError> {
        let name = self.name.clone();
        let notify_path = self.notify_path.clone();
        let scheduler = Arc::new(Mutex::new(self));
        let listener: Arc<dyn ParameterListener> = Arc::new(SchedulerListener {
            name: name.clone(),
            notify_path,
            scheduler: Arc::downgrade(&scheduler),
        });

        {
            let mut guard = scheduler.lock().unwrap_or_else(|e| e.into_inner());
            let registration = |source| SchedulerError::Registration {
                scheduler: name.clone(),
                source,
            };
            for batch in &guard.batches {
                batch.init(Arc::clone(&listener)).map_err(registration)?;
            }
            guard
                .registry
                .add_listener(&guard.heartbeat_path, Arc::clone(&listener))
                .map_err(registration)?;

            let heartbeat = std::slice::from_ref(&guard.heartbeat_path);
            match guard.registry.begin_monitoring(heartbeat) {
                Ok(()) => guard.heartbeat_monitored = true,
                Err(e) => warn!(
                    "{}: could not monitor heartbeat {}: {}",
                    name, guard.heartbeat_path, e
                ),
            }
        }
        info!("{}: installed", name);
        Ok(scheduler)
    }

    /// Entry point for parameter callbacks
    pub fn dataref_changed(&mut self, path: &str) {
        if path == self.notify_path {
            trace!("{}: ignore self update", self.name);
            return;
        }
        if path == self.heartbeat_path {
            debug!("{}: heartbeat received", self.name);
            self.handle(SchedulerEvent::Heartbeat);
            return;
        }
        if !self.state.collecting {
            return;
        }
        self.handle(SchedulerEvent::ParameterUpdated);
    }

    /// Process one event and apply its effects, returning them
    pub fn handle(&mut self, event: SchedulerEvent) -> Vec<Effect> {
        if self.batches.is_empty() {
            debug!("{}: no batches, ignoring {:?}", self.name, event);
        }
        let views = self.views();
        let Transition { state, effects } = transition(&self.state, event, &views);
        self.state = state;
        for effect in &effects {
            self.apply(*effect);
        }
        effects
    }

    /// Process a heartbeat without going through the registry
    pub fn heartbeat(&mut self) -> Vec<Effect> {
        self.handle(SchedulerEvent::Heartbeat)
    }

    /// Force every batch to be collected again and restart collection
    pub fn reload_again(&mut self) -> Vec<Effect> {
        info!("{}: reloading all batches", self.name);
        self.handle(SchedulerEvent::Restart)
    }

    /// Button activation: a press restarts collection
    pub fn activate(&mut self, pressed: bool) {
        if pressed {
            self.reload_again();
        }
    }

    fn views(&self) -> Vec<BatchView> {
        self.batches
            .iter()
            .enumerate()
            .map(|(i, batch)| BatchView {
                collected: batch.is_collected(),
                stagnant: self.state.current == Some(i)
                    && batch.did_not_progress(self.stagnation_window),
            })
            .collect()
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::ExpireStale => {
                let threshold = self.clock.now() - to_time_delta(self.refresh_window);
                for batch in &mut self.batches {
                    batch.collect(Some(threshold), false);
                }
            }
            Effect::ForceCollect => {
                for batch in &mut self.batches {
                    batch.collect(None, true);
                }
                debug!("{}: all batches ready to collect", self.name);
            }
            Effect::Unload(index) => self.batches[index].unload(),
            Effect::Load(index) => {
                self.batches[index].load();
                debug!(
                    "{}: changed to batch {} (cycle {})",
                    self.name,
                    self.batches[index].name(),
                    self.state.cycle
                );
            }
            Effect::MarkCollected(index) => self.batches[index].collected(),
            Effect::CompleteCycle => {
                for batch in &mut self.batches {
                    batch.collected();
                }
                debug!("{}: all batches collected", self.name);
            }
            Effect::Notify(count) => {
                self.last_notified = Some(self.clock.now());
                match self.registry.write_value(&self.notify_path, count.into()) {
                    Ok(()) => info!("{}: {} notified ({})", self.name, self.notify_path, count),
                    Err(e) => warn!("{}: failed to notify {}: {}", self.name, self.notify_path, e),
                }
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn heartbeat_path(&self) -> &str {
        &self.heartbeat_path
    }

    pub fn notify_path(&self) -> &str {
        &self.notify_path
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn cycle(&self) -> i64 {
        self.state.cycle
    }

    pub fn is_collecting(&self) -> bool {
        self.state.collecting
    }

    pub fn notification_count(&self) -> u64 {
        self.state.notification_count
    }

    pub fn last_notified(&self) -> Option<DateTime<Utc>> {
        self.last_notified
    }

    pub fn current_batch(&self) -> Option<&Batch> {
        self.state.current.and_then(|i| self.batches.get(i))
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// True when every batch is collected
    pub fn all_batches_collected(&self) -> bool {
        !self.batches.is_empty() && self.batches.iter().all(Batch::is_collected)
    }
}

impl Drop for BatchScheduler {
    fn drop(&mut self) {
        if let Some(index) = self.state.current {
            self.batches[index].unload();
        }
        if self.heartbeat_monitored {
            self.registry
                .end_monitoring(std::slice::from_ref(&self.heartbeat_path));
        }
        debug!("{}: released monitoring", self.name);
    }
}

/// Forwards registry callbacks to a scheduler
struct SchedulerListener {
    name: String,
    notify_path: String,
    scheduler: Weak<Mutex<BatchScheduler>>,
}

impl ParameterListener for SchedulerListener {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameter_updated(&self, parameter: &Parameter) {
        // Checked before locking: the scheduler writes this path itself
        if parameter.path == self.notify_path {
            return;
        }
        let Some(scheduler) = self.scheduler.upgrade() else {
            trace!("{}: scheduler dropped, ignoring {}", self.name, parameter.path);
            return;
        };
        let mut guard = match scheduler.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("{}: scheduler lock poisoned, recovering", self.name);
                poisoned.into_inner()
            }
        };
        guard.dataref_changed(&parameter.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::memory_registry::InMemoryRegistry;
    use crate::registry::ParameterRegistry;
    use cockpit_sync_types::{BatchDeclaration, ParameterValue, DEFAULT_HEARTBEAT_PATH};

    /// Records every value written to the parameters it listens to
    #[derive(Default)]
    struct RecordingListener {
        writes: Mutex<Vec<(String, Option<ParameterValue>)>>,
    }

    impl RecordingListener {
        fn values(&self) -> Vec<Option<ParameterValue>> {
            self.writes
                .lock()
                .unwrap()
                .iter()
                .map(|(_, value)| value.clone())
                .collect()
        }
    }

    impl ParameterListener for RecordingListener {
        fn parameter_updated(&self, parameter: &Parameter) {
            self.writes
                .lock()
                .unwrap()
                .push((parameter.path.clone(), parameter.value.clone()));
        }
    }

    struct Fixture {
        clock: Arc<ManualClock>,
        registry: Arc<InMemoryRegistry>,
        scheduler: Arc<Mutex<BatchScheduler>>,
        notify_writes: Arc<RecordingListener>,
    }

    impl Fixture {
        fn new(batches: Vec<BatchDeclaration>, stagnation_window_secs: u64) -> Self {
            Self::with_registry(batches, stagnation_window_secs, None)
        }

        fn with_registry(
            batches: Vec<BatchDeclaration>,
            stagnation_window_secs: u64,
            capacity: Option<usize>,
        ) -> Self {
            let clock = ManualClock::starting_now();
            let registry = Arc::new(match capacity {
                Some(c) => InMemoryRegistry::with_capacity(clock.clone(), c),
                None => InMemoryRegistry::new(clock.clone()),
            });
            let config = SchedulerConfig {
                name: "test".to_string(),
                stagnation_window_secs,
                batches,
                ..Default::default()
            };
            let scheduler = BatchScheduler::new(config, registry.clone(), clock.clone())
                .unwrap()
                .install()
                .unwrap();
            let notify_writes = Arc::new(RecordingListener::default());
            registry
                .add_listener("data:collector/test", notify_writes.clone())
                .unwrap();
            Self {
                clock,
                registry,
                scheduler,
                notify_writes,
            }
        }

        /// Heartbeat arriving through the simulator channel
        fn heartbeat(&self) {
            assert!(self.registry.deliver(DEFAULT_HEARTBEAT_PATH, 0.0.into()));
        }

        fn deliver(&self, path: &str) -> bool {
            self.registry.deliver(path, 1.0.into())
        }

        fn current(&self) -> Option<String> {
            let s = self.scheduler.lock().unwrap();
            s.current_batch().map(|b| b.name().to_string())
        }

        fn count(&self) -> u64 {
            self.scheduler.lock().unwrap().notification_count()
        }

        fn notified_value(&self) -> Option<ParameterValue> {
            self.registry.value("data:collector/test")
        }

        /// At most one batch holds monitoring, and it is the current one
        fn assert_single_active(&self) {
            let s = self.scheduler.lock().unwrap();
            let loaded: Vec<&str> = s
                .batches()
                .iter()
                .filter(|b| b.is_loaded())
                .map(|b| b.name())
                .collect();
            assert!(loaded.len() <= 1, "loaded batches: {:?}", loaded);
            if let Some(current) = s.current_batch() {
                assert!(current.last_loaded() >= current.last_unloaded());
                if !current.is_inert() {
                    assert_eq!(loaded, vec![current.name()]);
                }
            } else {
                assert!(loaded.is_empty());
            }
        }
    }

    fn single(name: &str, path: &str) -> BatchDeclaration {
        BatchDeclaration::new(name, vec![path.to_string()])
    }

    #[test]
    fn test_initial_state_is_idle() {
        let f = Fixture::new(vec![single("b0", "p0")], 10);
        let s = f.scheduler.lock().unwrap();
        assert_eq!(s.cycle(), -1);
        assert!(!s.is_collecting());
        assert!(s.current_batch().is_none());
        assert_eq!(s.notification_count(), 0);
    }

    #[test]
    fn test_stagnant_batches_cycle_forever_without_notifying() {
        let f = Fixture::new(
            vec![single("b0", "p0"), single("b1", "p1"), single("b2", "p2")],
            1,
        );
        let mut visited = Vec::new();
        let mut cycles = Vec::new();
        for _ in 0..9 {
            f.heartbeat();
            f.assert_single_active();
            visited.push(f.current().unwrap());
            cycles.push(f.scheduler.lock().unwrap().cycle());
            f.clock.advance(Duration::from_millis(1500));
        }
        assert_eq!(
            visited,
            vec!["b0", "b1", "b2", "b0", "b1", "b2", "b0", "b1", "b2"]
        );
        assert_eq!(cycles, (0..9).collect::<Vec<i64>>());
        assert_eq!(f.count(), 0);
        assert_eq!(f.notified_value(), None);
    }

    #[test]
    fn test_heartbeat_within_window_keeps_batch() {
        let f = Fixture::new(vec![single("b0", "p0"), single("b1", "p1")], 10);
        f.heartbeat();
        f.clock.advance(Duration::from_secs(5));
        f.heartbeat();
        assert_eq!(f.current().as_deref(), Some("b0"));
    }

    #[test]
    fn test_full_cycle_notifies_once_then_again_after_reload() {
        let f = Fixture::new(vec![single("b0", "p1"), single("b1", "p2")], 10);
        f.heartbeat();
        assert_eq!(f.current().as_deref(), Some("b0"));

        // Not monitored yet: the simulator does not send it
        assert!(!f.deliver("p2"));

        assert!(f.deliver("p1"));
        assert_eq!(f.current().as_deref(), Some("b1"));
        f.assert_single_active();

        assert!(f.deliver("p2"));
        assert_eq!(f.count(), 1);
        assert_eq!(f.notified_value(), Some(ParameterValue::Number(1.0)));
        assert!(f.current().is_none());
        assert_eq!(f.registry.monitored_paths(), vec![DEFAULT_HEARTBEAT_PATH]);
        assert_eq!(
            f.notify_writes.values(),
            vec![Some(ParameterValue::Number(1.0))]
        );

        f.scheduler.lock().unwrap().reload_again();
        assert_eq!(f.current().as_deref(), Some("b0"));
        assert!(f.deliver("p1"));
        assert_eq!(f.count(), 1);
        assert!(f.deliver("p2"));
        assert_eq!(f.count(), 2);
        assert_eq!(f.notified_value(), Some(ParameterValue::Number(2.0)));
        assert_eq!(f.notify_writes.values().len(), 2);
        assert!(f.scheduler.lock().unwrap().last_notified().is_some());
    }

    #[test]
    fn test_simultaneous_updates_notify_once() {
        let f = Fixture::new(
            vec![BatchDeclaration::new(
                "both",
                vec!["p1".to_string(), "p2".to_string()],
            )],
            10,
        );
        f.heartbeat();
        f.deliver("p1");
        f.deliver("p2");
        assert_eq!(f.count(), 1);

        // Late updates arriving outside the channel change nothing
        f.registry.write_value("p1", 2.0.into()).unwrap();
        f.registry.write_value("p2", 2.0.into()).unwrap();
        assert_eq!(f.count(), 1);

        let s = f.scheduler.lock().unwrap();
        assert!(s.batches().iter().all(|b| b.last_completed().is_some()));
    }

    #[test]
    fn test_heartbeat_after_completion_restarts_cycle() {
        let f = Fixture::new(vec![single("b0", "p1"), single("b1", "p2")], 10);
        f.heartbeat();
        f.deliver("p1");
        f.deliver("p2");
        assert_eq!(f.count(), 1);

        f.clock.advance(Duration::from_secs(60));
        f.heartbeat();
        assert_eq!(f.scheduler.lock().unwrap().cycle(), 2);
        assert_eq!(f.current().as_deref(), Some("b0"));
        f.deliver("p1");
        assert_eq!(f.count(), 2);
    }

    #[test]
    fn test_stale_batches_recollected_after_refresh_window() {
        let f = Fixture::new(vec![single("b0", "p1"), single("b1", "p2")], 10);
        f.heartbeat();
        f.deliver("p1");
        f.deliver("p2");

        f.clock.advance(Duration::from_secs(601));
        f.heartbeat();
        f.deliver("p1");
        // b1 expired with the refresh window and must be seen again
        assert_eq!(f.count(), 1);
        assert_eq!(f.current().as_deref(), Some("b1"));
        f.deliver("p2");
        assert_eq!(f.count(), 2);
    }

    #[test]
    fn test_stagnant_batch_skipped_on_update() {
        let f = Fixture::new(
            vec![
                BatchDeclaration::new("b0", vec!["p1".to_string(), "never".to_string()]),
                single("b1", "p2"),
            ],
            10,
        );
        f.heartbeat();
        f.deliver("p1");
        assert_eq!(f.current().as_deref(), Some("b0"));
        f.clock.advance(Duration::from_secs(11));
        f.deliver("p1");
        assert_eq!(f.current().as_deref(), Some("b1"));
        f.assert_single_active();
    }

    #[test]
    fn test_array_declaration_visits_each_index() {
        let f = Fixture::new(
            vec![BatchDeclaration::array(
                "cloud",
                vec!["sim/cloud_type".to_string()],
                3,
            )],
            10,
        );
        f.heartbeat();
        assert!(f.deliver("sim/cloud_type[0]"));
        assert!(f.deliver("sim/cloud_type[1]"));
        assert_eq!(f.current().as_deref(), Some("cloud 2"));
        assert!(f.deliver("sim/cloud_type[2]"));
        assert_eq!(f.count(), 1);
    }

    #[test]
    fn test_capacity_limited_channel_collects_everything() {
        let batches = (0..4)
            .map(|b| {
                BatchDeclaration::new(
                    format!("b{}", b),
                    (0..3).map(|p| format!("sim/b{}/p{}", b, p)).collect(),
                )
            })
            .collect();
        // One slot for the heartbeat, three for the active batch
        let f = Fixture::with_registry(batches, 10, Some(4));
        f.heartbeat();
        for b in 0..4 {
            for p in 0..3 {
                assert!(f.deliver(&format!("sim/b{}/p{}", b, p)));
                assert!(f.registry.monitored_count() <= 4);
            }
        }
        assert_eq!(f.count(), 1);
    }

    #[test]
    fn test_inert_batch_is_skipped() {
        let f = Fixture::new(
            vec![BatchDeclaration::new("empty", vec![]), single("b1", "p1")],
            1,
        );
        f.heartbeat();
        assert_eq!(f.current().as_deref(), Some("empty"));
        f.clock.advance(Duration::from_secs(2));
        f.heartbeat();
        assert_eq!(f.current().as_deref(), Some("b1"));
        f.deliver("p1");
        // The inert batch never collects, so the cycle never completes
        assert_eq!(f.count(), 0);
    }

    #[test]
    fn test_heartbeat_delivered_through_channel_starts_collection() {
        let clock = ManualClock::starting_now();
        let registry = Arc::new(InMemoryRegistry::with_capacity(clock.clone(), 40));
        let config = SchedulerConfig {
            batches: vec![single("b0", "p1")],
            ..Default::default()
        };
        let scheduler = BatchScheduler::new(config, registry.clone(), clock)
            .unwrap()
            .install()
            .unwrap();
        assert!(registry.is_monitored(DEFAULT_HEARTBEAT_PATH));

        assert!(registry.deliver(DEFAULT_HEARTBEAT_PATH, 1.0.into()));
        assert!(scheduler.lock().unwrap().is_collecting());
        assert_eq!(registry.monitored_count(), 2);

        drop(scheduler);
        assert_eq!(registry.monitored_count(), 0);
    }

    #[test]
    fn test_heartbeat_without_channel_slot_is_logged_not_fatal() {
        let clock = ManualClock::starting_now();
        let registry = Arc::new(InMemoryRegistry::with_capacity(clock.clone(), 0));
        let config = SchedulerConfig {
            batches: vec![single("b0", "p1")],
            ..Default::default()
        };
        let scheduler = BatchScheduler::new(config, registry.clone(), clock)
            .unwrap()
            .install()
            .unwrap();
        assert!(!registry.is_monitored(DEFAULT_HEARTBEAT_PATH));
        assert!(!registry.deliver(DEFAULT_HEARTBEAT_PATH, 1.0.into()));
        assert!(!scheduler.lock().unwrap().is_collecting());
    }

    #[test]
    fn test_no_batches_ignores_heartbeats() {
        let f = Fixture::new(vec![], 1);
        f.heartbeat();
        f.heartbeat();
        let s = f.scheduler.lock().unwrap();
        assert!(!s.is_collecting());
        assert_eq!(s.cycle(), -1);
    }

    #[test]
    fn test_activate_press_restarts() {
        let f = Fixture::new(vec![single("b0", "p1")], 10);
        f.scheduler.lock().unwrap().activate(false);
        assert!(f.current().is_none());
        f.scheduler.lock().unwrap().activate(true);
        assert_eq!(f.current().as_deref(), Some("b0"));
        f.deliver("p1");
        assert_eq!(f.count(), 1);
    }

    #[test]
    fn test_dropped_scheduler_silences_listener() {
        let f = Fixture::new(vec![single("b0", "p1")], 10);
        let Fixture {
            registry, scheduler, ..
        } = f;
        drop(scheduler);
        assert!(!registry.deliver(DEFAULT_HEARTBEAT_PATH, 0.0.into()));
        registry
            .write_value(DEFAULT_HEARTBEAT_PATH, 0.0.into())
            .unwrap();
        assert_eq!(registry.monitored_count(), 0);
    }

    #[test]
    fn test_notify_path_conflict_rejected() {
        let clock = ManualClock::starting_now();
        let registry = Arc::new(InMemoryRegistry::new(clock.clone()));
        let config = SchedulerConfig {
            notify_path: Some("p1".to_string()),
            batches: vec![single("b0", "p1")],
            ..Default::default()
        };
        assert!(matches!(
            BatchScheduler::new(config, registry, clock),
            Err(SchedulerError::NotifyPathConflict { .. })
        ));
    }

    #[test]
    fn test_two_schedulers_keep_their_own_windows() {
        let clock = ManualClock::starting_now();
        let registry = Arc::new(InMemoryRegistry::new(clock.clone()));
        let make = |name: &str, window: u64, path: &str| {
            let config = SchedulerConfig {
                name: name.to_string(),
                stagnation_window_secs: window,
                batches: vec![single("a", &format!("{}/a", path)), single("b", &format!("{}/b", path))],
                ..Default::default()
            };
            BatchScheduler::new(config, registry.clone(), clock.clone())
                .unwrap()
                .install()
                .unwrap()
        };
        let fast = make("fast", 1, "fast");
        let slow = make("slow", 30, "slow");

        registry.write_value(DEFAULT_HEARTBEAT_PATH, 0.0.into()).unwrap();
        clock.advance(Duration::from_secs(5));
        registry.write_value(DEFAULT_HEARTBEAT_PATH, 0.0.into()).unwrap();

        assert_eq!(fast.lock().unwrap().current_batch().unwrap().name(), "b");
        assert_eq!(slow.lock().unwrap().current_batch().unwrap().name(), "a");
    }
}
