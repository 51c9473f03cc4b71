//! Cooldown gate against repeated submissions for one tap.
//!
//! A target left on the reader is detected again on every poll. The
//! deduplicator suppresses a detection when it has the same hardware
//! identifier as the last accepted one and arrives within the cooldown. It
//! keys on the hardware UID, never on the resolved identifier, so a phone is
//! gated the same way whether or not its custom read succeeded.
//!
//! Elapsed time is measured on a monotonic [`Instant`], so wall-clock steps
//! neither extend nor cut short a cooldown.

use std::time::{Duration, Instant};

use classtap_core::constants::DEFAULT_SCAN_COOLDOWN_SECS;

#[derive(Debug, Clone)]
pub struct ScanDeduplicator {
    cooldown: Duration,
    last: Option<(String, Instant)>,
}

impl ScanDeduplicator {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last: None,
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Last accepted identifier and when it was accepted.
    pub fn last(&self) -> Option<(&str, Instant)> {
        self.last.as_ref().map(|(id, at)| (id.as_str(), *at))
    }

    /// Whether a detection of `raw_hex` at `now` should go through.
    ///
    /// A repeat at exactly the cooldown is accepted.
    pub fn should_accept(&self, raw_hex: &str, now: Instant) -> bool {
        match &self.last {
            Some((last_id, last_at)) if last_id == raw_hex => {
                now.saturating_duration_since(*last_at) >= self.cooldown
            }
            _ => true,
        }
    }

    /// Remember an accepted detection.
    pub fn record(&mut self, raw_hex: &str, now: Instant) {
        self.last = Some((raw_hex.to_string(), now));
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

impl Default for ScanDeduplicator {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_SCAN_COOLDOWN_SECS))
    }
}
