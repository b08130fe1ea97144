#[cfg(test)]
mod tests;

use std::time::{Duration, Instant};

/// A periodic timer driving the deferred screen refresh.
pub struct FrameTimer {
    interval: Duration,
    next: Instant,
}

impl FrameTimer {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            next: now + interval,
        }
    }

    /// Time left until the next tick.
    pub fn timeout(&self, now: Instant) -> Duration {
        self.next.saturating_duration_since(now)
    }

    /// Returns whether a tick is due and schedules the following one.
    /// Missed ticks are skipped rather than replayed.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next {
            return false;
        }
        self.next += self.interval;
        if self.next <= now {
            let behind = now.duration_since(self.next).as_nanos() / self.interval.as_nanos().max(1);
            self.next += self.interval * (behind as u32 + 1);
        }
        true
    }
}
