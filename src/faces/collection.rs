//! Collection progress face
//!
//! Animated representation of a batch scheduler: a spinner while batches
//! are being collected, followed by the batch currently loaded and the
//! number of completed collection cycles read back from the scheduler's
//! notify parameter. Rendering goes to the log.

use cockpit_sync_core::{BatchScheduler, LiveUpdate, SharedRegistry};
use log::{info, trace};
use std::sync::{Arc, Mutex, Weak};

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

/// Live face showing the progress of one scheduler
pub struct CollectionFace {
    name: String,
    scheduler: Weak<Mutex<BatchScheduler>>,
    registry: SharedRegistry,
    notify_path: String,
    enabled: bool,
    frame: usize,
    counter: Option<i64>,
    /// Active batch and how many of its parameters hold a value
    progress: Option<(String, usize, usize)>,
    rendered_counter: Option<i64>,
    text: String,
}

impl CollectionFace {
    pub fn new(scheduler: &Arc<Mutex<BatchScheduler>>, registry: SharedRegistry) -> Self {
        let (name, notify_path) = {
            let guard = scheduler.lock().unwrap_or_else(|e| e.into_inner());
            (format!("{}-face", guard.name()), guard.notify_path().to_string())
        };
        Self {
            name,
            scheduler: Arc::downgrade(scheduler),
            registry,
            notify_path,
            enabled: true,
            frame: 0,
            counter: None,
            progress: None,
            rendered_counter: None,
            text: String::new(),
        }
    }

    /// Last rendered face
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Completed collection cycles, as read from the notify parameter
    pub fn counter(&self) -> Option<i64> {
        self.counter
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl LiveUpdate for CollectionFace {
    fn name(&self) -> &str {
        &self.name
    }

    fn update(&mut self) {
        self.frame = (self.frame + 1) % SPINNER.len();
        self.counter = self
            .registry
            .value(&self.notify_path)
            .and_then(|v| v.as_i64());

        self.progress = self.scheduler.upgrade().and_then(|scheduler| {
            let guard = scheduler.lock().ok()?;
            let batch = guard.current_batch()?;
            let status = batch.status();
            Some((batch.name().to_string(), status.filled, status.count))
        });
    }

    fn render(&mut self) {
        let cycles = self.counter.unwrap_or(0);
        self.text = match &self.progress {
            Some((batch, filled, count)) => format!(
                "{} {} {}/{} [{}]",
                SPINNER[self.frame], batch, filled, count, cycles
            ),
            None => format!("  idle [{}]", cycles),
        };

        if self.counter != self.rendered_counter {
            info!("{}: collection cycle {} complete", self.name, cycles);
            self.rendered_counter = self.counter;
        } else {
            trace!("{}: {}", self.name, self.text);
        }
    }

    fn should_run(&self) -> bool {
        self.enabled && self.scheduler.strong_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cockpit_sync_core::{
        BatchDeclaration, InMemoryRegistry, ManualClock, SchedulerConfig,
    };

    fn setup() -> (Arc<InMemoryRegistry>, Arc<Mutex<BatchScheduler>>, CollectionFace) {
        let clock = ManualClock::starting_now();
        let registry = Arc::new(InMemoryRegistry::new(clock.clone()));
        let config = SchedulerConfig {
            name: "face".to_string(),
            heartbeat_path: "sim/test/heartbeat".to_string(),
            batches: vec![BatchDeclaration::new(
                "one",
                vec!["sim/a".to_string(), "sim/b".to_string()],
            )],
            ..SchedulerConfig::default()
        };
        let scheduler = BatchScheduler::new(config, registry.clone(), clock)
            .unwrap()
            .install()
            .unwrap();
        let face = CollectionFace::new(&scheduler, registry.clone());
        (registry, scheduler, face)
    }

    #[test]
    fn test_idle_before_first_heartbeat() {
        let (_registry, _scheduler, mut face) = setup();
        assert_eq!(face.name(), "face-face");
        face.update();
        face.render();
        assert_eq!(face.text(), "  idle [0]");
        assert_eq!(face.counter(), None);
    }

    #[test]
    fn test_shows_active_batch_then_counter() {
        let (registry, _scheduler, mut face) = setup();
        assert!(registry.deliver("sim/test/heartbeat", 1i64.into()));

        registry.deliver("sim/a", 3.0.into());
        face.update();
        face.render();
        assert_eq!(face.text(), "/ one 1/2 [0]");

        registry.deliver("sim/b", 4.0.into());
        face.update();
        face.render();
        assert_eq!(face.counter(), Some(1));
        assert_eq!(face.text(), "  idle [1]");
    }

    #[test]
    fn test_stops_running_without_scheduler() {
        let (_registry, scheduler, mut face) = setup();
        assert!(face.should_run());
        face.set_enabled(false);
        assert!(!face.should_run());
        face.set_enabled(true);

        drop(scheduler);
        assert!(!face.should_run());
    }
}
