//! Time source for the scan loop.
//!
//! The loop stamps scans with wall-clock time, measures the dedup cooldown on
//! a monotonic instant and waits between cycles. All of it goes through
//! [`Clock`] so tests can drive time by hand.

#![allow(async_fn_in_trait)]

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    /// Wall-clock time, used for scan timestamps.
    fn now(&self) -> DateTime<Utc>;

    /// Monotonic time, used for cooldowns. Never goes backwards.
    fn instant(&self) -> Instant;

    async fn sleep(&self, duration: Duration);
}

/// Real time: `Utc::now`, `Instant::now` and `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Hand-driven clock; `sleep` advances time instantly.
///
/// `advance` moves wall and monotonic time together. `set` moves only the
/// wall clock, like an NTP step. Clones share the same time, so a test can
/// keep one and hand another to the scanner.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use classtap_scanner::clock::{Clock, ManualClock};
/// use std::time::Duration;
///
/// let start = Utc.with_ymd_and_hms(2025, 10, 5, 12, 0, 0).unwrap();
/// let clock = ManualClock::new(start);
/// clock.advance(Duration::from_secs(2));
/// assert_eq!((clock.now() - start).num_seconds(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    state: Arc<Mutex<ManualTime>>,
}

#[derive(Debug)]
struct ManualTime {
    wall: DateTime<Utc>,
    elapsed: Duration,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            origin: Instant::now(),
            state: Arc::new(Mutex::new(ManualTime {
                wall: start,
                elapsed: Duration::ZERO,
            })),
        }
    }

    pub fn advance(&self, duration: Duration) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        // Out-of-range advances leave the time unchanged
        let Some(wall) = chrono::Duration::from_std(duration)
            .ok()
            .and_then(|delta| state.wall.checked_add_signed(delta))
        else {
            return;
        };
        let Some(elapsed) = state.elapsed.checked_add(duration) else {
            return;
        };
        state.wall = wall;
        state.elapsed = elapsed;
    }

    /// Step the wall clock to `time`; monotonic time is unaffected.
    pub fn set(&self, time: DateTime<Utc>) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .wall = time;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).wall
    }

    fn instant(&self) -> Instant {
        let elapsed = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed;
        // Falls back to the origin if the sum overflows Instant
        self.origin.checked_add(elapsed).unwrap_or(self.origin)
    }

    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
        // Let other tasks observe the new time
        tokio::task::yield_now().await;
    }
}
