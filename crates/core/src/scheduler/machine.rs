//! Pure collection state machine
//!
//! `transition` maps the current state, one event and a snapshot of every
//! batch's status to the next state and the effects the scheduler must
//! apply, in order. It performs no I/O and reads no clock.

use serde::Serialize;

/// Events driving the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// The heartbeat parameter ticked
    Heartbeat,
    /// A monitored batch parameter was updated
    ParameterUpdated,
    /// Explicit request to collect everything again
    Restart,
}

/// Collection state of one scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchedulerState {
    /// Monotonic visit counter; the active batch is `cycle % N`
    pub cycle: i64,
    /// Index of the active batch
    pub current: Option<usize>,
    pub collecting: bool,
    /// Completed cycles so far
    pub notification_count: u64,
}

impl Default for SchedulerState {
    fn default() -> Self {
        Self {
            cycle: -1,
            current: None,
            collecting: false,
            notification_count: 0,
        }
    }
}

impl SchedulerState {
    pub fn is_idle(&self) -> bool {
        !self.collecting
    }
}

/// Status of one batch at the time an event is processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchView {
    pub collected: bool,
    pub stagnant: bool,
}

/// Side effects requested by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Clear `last_loaded` on batches completed before the refresh window
    ExpireStale,
    /// Clear `last_loaded` on every batch
    ForceCollect,
    Unload(usize),
    Load(usize),
    /// Stamp `last_completed` on one batch
    MarkCollected(usize),
    /// Stamp `last_completed` on every batch
    CompleteCycle,
    /// Write the counter to the notify parameter
    Notify(u64),
}

/// Result of processing one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: SchedulerState,
    pub effects: Vec<Effect>,
}

/// Compute the next state for `event`.
///
/// `views` holds one entry per batch, in declaration order.
pub fn transition(state: &SchedulerState, event: SchedulerEvent, views: &[BatchView]) -> Transition {
    let mut next = Builder {
        state: *state,
        effects: Vec::new(),
        batch_count: views.len(),
    };
    if views.is_empty() {
        return next.finish();
    }

    let current_view = state.current.and_then(|i| views.get(i)).copied();

    match event {
        SchedulerEvent::Heartbeat => {
            if state.collecting {
                if current_view.map_or(false, |v| v.stagnant) {
                    next.change_batch();
                }
            } else {
                next.effects.push(Effect::ExpireStale);
                next.start_collection();
            }
        }
        SchedulerEvent::ParameterUpdated => {
            if !state.collecting {
                return next.finish();
            }
            if views.iter().all(|v| v.collected) {
                next.stop_collecting();
                next.effects.push(Effect::CompleteCycle);
                next.state.notification_count += 1;
                next.effects.push(Effect::Notify(next.state.notification_count));
            } else if let (Some(index), Some(view)) = (state.current, current_view) {
                if view.collected {
                    next.effects.push(Effect::MarkCollected(index));
                    next.change_batch();
                } else if view.stagnant {
                    next.change_batch();
                }
            }
        }
        SchedulerEvent::Restart => {
            next.effects.push(Effect::ForceCollect);
            next.start_collection();
        }
    }
    next.finish()
}

struct Builder {
    state: SchedulerState,
    effects: Vec<Effect>,
    batch_count: usize,
}

impl Builder {
    fn advance(&mut self) {
        self.state.cycle += 1;
        let index = self.state.cycle.rem_euclid(self.batch_count as i64) as usize;
        self.state.current = Some(index);
        self.effects.push(Effect::Load(index));
    }

    fn unload_current(&mut self) {
        if let Some(index) = self.state.current.take() {
            self.effects.push(Effect::Unload(index));
        }
    }

    fn start_collection(&mut self) {
        // A restart while collecting must not leave the old batch monitored
        self.unload_current();
        self.state.collecting = true;
        self.advance();
    }

    fn change_batch(&mut self) {
        self.unload_current();
        self.advance();
    }

    fn stop_collecting(&mut self) {
        self.state.collecting = false;
        self.unload_current();
    }

    fn finish(self) -> Transition {
        Transition {
            state: self.state,
            effects: self.effects,
        }
    }
}
