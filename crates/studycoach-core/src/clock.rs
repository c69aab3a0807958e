//! Time source for quiz sessions.
//!
//! A clock answers two questions: what the wall-clock time is (for
//! timestamps that end up in the history) and how much time has passed
//! since a [`Mark`] (for question budgets). The second never goes
//! backwards, even when the wall clock is stepped.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeDelta, Utc};

/// Where a session reads the current time from.
///
/// `Manual` clocks share their time between clones, so a test can keep a
/// handle and move time forward while a session holds the other one.
#[derive(Debug, Clone, Default)]
pub enum Clock {
    #[default]
    System,
    Manual(Arc<Mutex<ManualTime>>),
}

/// State behind a manual clock.
#[derive(Debug)]
pub struct ManualTime {
    wall: DateTime<Utc>,
    monotonic: Duration,
}

/// A point on a clock's monotonic timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    System(Instant),
    Manual(Duration),
}

impl Clock {
    /// Returns a clock that uses the current system time.
    pub fn system() -> Self {
        Clock::System
    }

    /// Returns a manual clock starting at the given timestamp.
    pub fn manual(at: DateTime<Utc>) -> Self {
        Clock::Manual(Arc::new(Mutex::new(ManualTime {
            wall: at,
            monotonic: Duration::ZERO,
        })))
    }

    /// Wall-clock time.
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Manual(time) => time.lock().unwrap_or_else(|e| e.into_inner()).wall,
        }
    }

    /// Capture the current point on the monotonic timeline.
    pub fn mark(&self) -> Mark {
        match self {
            Clock::System => Mark::System(Instant::now()),
            Clock::Manual(time) => {
                Mark::Manual(time.lock().unwrap_or_else(|e| e.into_inner()).monotonic)
            }
        }
    }

    /// Monotonic time passed since `mark`. Marks taken from a different
    /// kind of clock measure as zero.
    pub fn since(&self, mark: Mark) -> Duration {
        match (self, mark) {
            (Clock::System, Mark::System(at)) => at.elapsed(),
            (Clock::Manual(time), Mark::Manual(at)) => time
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .monotonic
                .saturating_sub(at),
            _ => Duration::ZERO,
        }
    }

    /// Let time pass on a manual clock. Has no effect on `Clock::System`.
    ///
    /// A negative delta moves the wall time back without rewinding the
    /// monotonic timeline.
    pub fn advance(&self, delta: TimeDelta) {
        if let Clock::Manual(time) = self {
            let mut time = time.lock().unwrap_or_else(|e| e.into_inner());
            time.wall += delta;
            time.monotonic += delta.to_std().unwrap_or(Duration::ZERO);
        }
    }

    /// Step the wall time of a manual clock without any time passing, as
    /// an NTP correction or a user changing the system time would.
    pub fn step_wall(&self, delta: TimeDelta) {
        if let Clock::Manual(time) = self {
            time.lock().unwrap_or_else(|e| e.into_inner()).wall += delta;
        }
    }
}
