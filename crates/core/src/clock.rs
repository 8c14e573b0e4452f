//! Time source shared by the registry, batches and schedulers
//!
//! Batch windows are expressed against a `Clock` rather than the wall clock
//! directly, so stagnation and refresh behaviour can be driven by hand.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Type-erased clock shared between components
pub type SharedClock = Arc<dyn Clock>;

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

static SYSTEM_CLOCK: Lazy<SharedClock> = Lazy::new(|| Arc::new(SystemClock));

impl SystemClock {
    /// Process-wide wall clock handle
    pub fn shared() -> SharedClock {
        Arc::clone(&SYSTEM_CLOCK)
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Manual clock starting at the current wall-clock time
    pub fn starting_now() -> Arc<Self> {
        Arc::new(Self::new(Utc::now()))
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += to_time_delta(by);
        }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        if let Ok(mut now) = self.now.lock() {
            *now = to;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Convert a std duration into a chrono delta, saturating at ~292 million years
pub fn to_time_delta(d: Duration) -> chrono::Duration {
    chrono::Duration::milliseconds(d.as_millis().min(i64::MAX as u128) as i64)
}

/// Time elapsed since `then`, zero if `then` lies in the future
pub fn elapsed_since(clock: &dyn Clock, then: DateTime<Utc>) -> Duration {
    (clock.now() - then).to_std().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::starting_now();
        let start = clock.now();
        clock.advance(Duration::from_millis(1500));
        assert_eq!(elapsed_since(clock.as_ref(), start), Duration::from_millis(1500));
    }

    #[test]
    fn test_elapsed_since_future_is_zero() {
        let clock = ManualClock::starting_now();
        let future = clock.now() + to_time_delta(Duration::from_secs(5));
        assert_eq!(elapsed_since(clock.as_ref(), future), Duration::ZERO);
    }
}
