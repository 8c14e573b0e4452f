//! Periodic update worker for dynamic button faces
//!
//! Each animated representation owns one `LiveUpdateTask`. The task runs a
//! dedicated thread that waits one interval, then calls `update()` and
//! `render()` on its target, until cancelled. Cancellation is cooperative:
//! `stop()` signals the worker and waits a bounded time for it to exit. A
//! worker that does not confirm in time is abandoned, never killed, and a
//! new worker is refused until the abandoned one has terminated.

use cockpit_sync_types::LiveUpdateConfig;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Something refreshed on a timer
///
/// `update()` must tolerate being called when nothing changed, and
/// `render()` must be safe to call redundantly. Neither is assumed to run on
/// any particular thread.
pub trait LiveUpdate: Send + 'static {
    /// Name used for the worker thread and log messages
    fn name(&self) -> &str {
        "live-update"
    }

    /// Advance internal state (fetch values, step an animation frame)
    fn update(&mut self);

    /// Push the current face to its output
    fn render(&mut self);

    /// Whether the task should currently be running
    fn should_run(&self) -> bool {
        true
    }
}

/// Result of `LiveUpdateTask::stop`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Nothing was running
    NotRunning,
    /// The worker confirmed termination
    Stopped,
    /// The worker did not terminate in time and was left behind
    Abandoned,
}

/// A spawned worker thread and its control channels
struct Worker {
    handle: JoinHandle<()>,
    cancel: Sender<()>,
    done: Receiver<()>,
}

/// Clears the running flag and signals termination however the worker exits
struct ExitGuard {
    running: Arc<AtomicBool>,
    done: Sender<()>,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        let _ = self.done.try_send(());
    }
}

/// Cooperative periodic worker driving a `LiveUpdate` target
pub struct LiveUpdateTask<T: LiveUpdate> {
    name: String,
    target: Arc<Mutex<T>>,
    config: LiveUpdateConfig,
    running: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    worker: Option<Worker>,
    /// Worker that missed its stop timeout
    abandoned: Option<Worker>,
}

impl<T: LiveUpdate> LiveUpdateTask<T> {
    pub fn new(target: T, config: LiveUpdateConfig) -> Self {
        let name = target.name().to_string();
        Self::with_shared(name, Arc::new(Mutex::new(target)), config)
    }

    /// Task over a target that is also reachable from elsewhere
    pub fn with_shared(name: impl Into<String>, target: Arc<Mutex<T>>, config: LiveUpdateConfig) -> Self {
        Self {
            name: name.into(),
            target,
            config,
            running: Arc::new(AtomicBool::new(false)),
            ticks: Arc::new(AtomicU64::new(0)),
            worker: None,
            abandoned: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &Arc<Mutex<T>> {
        &self.target
    }

    pub fn interval(&self) -> Duration {
        self.config.interval()
    }

    /// Completed update/render ticks since the task was created
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    /// True while a worker exists and has not observed cancellation
    pub fn is_running(&self) -> bool {
        self.worker.is_some() && self.running.load(Ordering::Acquire)
    }

    /// Start the worker. Returns false if nothing was spawned.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            warn!("{}: already started", self.name);
            return false;
        }
        // A worker that exited on its own (e.g. a panicking target)
        if let Some(worker) = self.worker.take() {
            Self::reap(&self.name, worker);
        }
        if let Some(worker) = self.abandoned.take() {
            if worker.handle.is_finished() {
                Self::reap(&self.name, worker);
            } else {
                warn!(
                    "{}: previous worker has not terminated yet, not starting",
                    self.name
                );
                self.abandoned = Some(worker);
                return false;
            }
        }

        let (cancel_tx, cancel_rx) = channel::bounded::<()>(1);
        let (done_tx, done_rx) = channel::bounded::<()>(1);
        self.running.store(true, Ordering::Release);

        let guard = ExitGuard {
            running: Arc::clone(&self.running),
            done: done_tx,
        };
        let target = Arc::clone(&self.target);
        let ticks = Arc::clone(&self.ticks);
        let interval = self.config.interval();
        let name = self.name.clone();

        let spawned = thread::Builder::new()
            .name(format!("LiveUpdate::loop({})", self.name))
            .spawn(move || {
                let _guard = guard;
                run_loop(&name, &target, &ticks, interval, &cancel_rx);
            });

        match spawned {
            Ok(handle) => {
                self.worker = Some(Worker {
                    handle,
                    cancel: cancel_tx,
                    done: done_rx,
                });
                debug!("{}: started ({:?} interval)", self.name, interval);
                true
            }
            Err(e) => {
                // The closure (and its guard) was dropped, running is false again
                warn!("{}: failed to spawn worker: {}", self.name, e);
                false
            }
        }
    }

    /// Signal the worker to stop and wait for it, at most `max(2 × interval, floor)`
    pub fn stop(&mut self) -> StopOutcome {
        let Some(worker) = self.worker.take() else {
            debug!("{}: already stopped", self.name);
            return StopOutcome::NotRunning;
        };
        let _ = worker.cancel.try_send(());

        let timeout = self.config.join_timeout();
        match worker.done.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                Self::reap(&self.name, worker);
                debug!("{}: stopped", self.name);
                StopOutcome::Stopped
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "{}: worker did not terminate (timeout {:?}), abandoning it",
                    self.name, timeout
                );
                self.abandoned = Some(worker);
                StopOutcome::Abandoned
            }
        }
    }

    /// Start or stop according to the target's `should_run()`
    pub fn sync(&mut self) {
        let should_run = match self.target.lock() {
            Ok(target) => target.should_run(),
            Err(_) => {
                warn!("{}: target lock poisoned", self.name);
                false
            }
        };
        if should_run && !self.is_running() {
            self.start();
        } else if !should_run && self.is_running() {
            self.stop();
        }
    }

    /// Render once on request, outside the tick schedule
    pub fn render_now(&self) {
        match self.target.lock() {
            Ok(mut target) => target.render(),
            Err(_) => warn!("{}: target lock poisoned, not rendering", self.name),
        }
    }

    fn reap(name: &str, worker: Worker) {
        if worker.handle.join().is_err() {
            warn!("{}: worker panicked", name);
        }
    }
}

impl<T: LiveUpdate> Drop for LiveUpdateTask<T> {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.stop();
        }
    }
}

/// Worker body: wait one interval, then tick, until cancelled
fn run_loop<T: LiveUpdate>(
    name: &str,
    target: &Mutex<T>,
    ticks: &AtomicU64,
    interval: Duration,
    cancel: &Receiver<()>,
) {
    loop {
        match cancel.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
        let Ok(mut target) = target.lock() else {
            warn!("{}: target lock poisoned, exiting", name);
            break;
        };
        target.update();
        target.render();
        ticks.fetch_add(1, Ordering::AcqRel);
    }
    info!("{}: exited", name);
}
