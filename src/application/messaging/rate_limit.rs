//! Input debouncing

use std::time::{Duration, Instant};

/// Locks a session's input for `window` after every accepted line.
///
/// Lines arriving while locked are dropped, not queued. Dropped lines do not
/// extend the lock.
#[derive(Debug, Clone)]
pub struct Debounce {
    window: Duration,
    locked_until: Option<Instant>,
}

impl Debounce {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            locked_until: None,
        }
    }

    pub fn locked_until(&self) -> Option<Instant> {
        self.locked_until
    }

    /// Returns true if a line received at `now` should be processed
    pub fn admit(&mut self, now: Instant) -> bool {
        if matches!(self.locked_until, Some(until) if now < until) {
            return false;
        }

        self.locked_until = if self.window.is_zero() {
            None
        } else {
            Some(now + self.window)
        };
        true
    }
}
