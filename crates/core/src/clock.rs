// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time abstraction so admission ordering and timestamps are testable.

use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// Source of monotonic instants and wall-clock timestamps.
///
/// Everything that needs "now" — semaphore wait ordering, `queued_at`,
/// `started_at`, `completed_at` on [`crate::hook_execution::HookExecution`] —
/// goes through this trait instead of calling `Instant::now()`/`Utc::now()`
/// directly, so tests can advance time deterministically.
pub trait Clock: Send + Sync + 'static {
    /// Monotonic instant, used for ordering (e.g. FIFO semaphore waiters).
    fn now(&self) -> Instant;

    /// Wall-clock timestamp, used for persisted/displayed timestamps.
    fn utc_now(&self) -> DateTime<Utc>;
}

/// Real clock backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Deterministic clock for tests: `now()`/`utc_now()` only change via
/// [`FakeClock::advance`] or [`FakeClock::set_utc`].
pub struct FakeClock {
    instant: Mutex<Instant>,
    utc: Mutex<DateTime<Utc>>,
}

impl FakeClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            instant: Mutex::new(Instant::now()),
            utc: Mutex::new(start),
        }
    }

    /// Advance both the monotonic and wall clocks by `delta`.
    pub fn advance(&self, delta: chrono::Duration) {
        let std_delta = delta
            .to_std()
            .unwrap_or(std::time::Duration::from_secs(0));
        *self.instant.lock() += std_delta;
        *self.utc.lock() += delta;
    }

    /// Pin the wall clock to an exact timestamp without moving the monotonic clock.
    pub fn set_utc(&self, at: DateTime<Utc>) {
        *self.utc.lock() = at;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.instant.lock()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        *self.utc.lock()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;