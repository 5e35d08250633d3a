//! A tiny clock abstraction standing in for a unified time service: a
//! process-wide singleton, initialized once at startup and never mutated
//! thereafter, from which every timestamp the core produces — session
//! expiry, event ordering, outbound frame `timestamp`/`unix` — goes through
//! one [`Clock`] instance so tests can inject a fixed time instead of
//! racing the wall clock.

use chrono::{DateTime, Utc};

/// Source of the current time, injectable for deterministic tests.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;
}

/// Real wall-clock time via [`chrono::Utc::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed time for tests, optionally advanceable.
#[derive(Debug)]
pub struct FixedClock(parking_lot::Mutex<DateTime<Utc>>);

impl FixedClock {
    /// Start the clock at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self(parking_lot::Mutex::new(start))
    }

    /// Move the clock forward.
    pub fn advance(&self, delta: chrono::Duration) {
        let mut guard = self.0.lock();
        *guard += delta;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock()
    }
}
