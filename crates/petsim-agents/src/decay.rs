//! Converts elapsed simulated time into need decreases.
//!
//! Rates are expressed per hour and applied to the actual elapsed delta
//! between two updates, never as a fixed per-tick decrement, so a pet
//! decays the same amount whether the loop runs at 10 or 120 ticks per
//! second.

/// Milliseconds in one second.
pub const MS_PER_SECOND: f64 = 1000.0;

/// Seconds in one hour.
pub const SECONDS_PER_HOUR: f64 = 3600.0;

/// Convert a millisecond span to seconds.
#[allow(clippy::cast_precision_loss)]
pub fn ms_to_seconds(ms: u64) -> f64 {
    // Spans between two updates stay far below 2^52 ms.
    ms as f64 / MS_PER_SECOND
}

/// Amount lost over `elapsed_ms` at `rate_per_hour`.
pub fn decay_amount(rate_per_hour: f64, elapsed_ms: u64) -> f64 {
    if !rate_per_hour.is_finite() || rate_per_hour <= 0.0 {
        return 0.0;
    }
    rate_per_hour / SECONDS_PER_HOUR * ms_to_seconds(elapsed_ms)
}

/// `level` after decaying for `elapsed_ms`, floored at zero.
pub fn decayed_level(level: f64, rate_per_hour: f64, elapsed_ms: u64) -> f64 {
    (level - decay_amount(rate_per_hour, elapsed_ms)).max(0.0)
}

/// Remembers when a level was last decayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecayClock {
    last_ms: u64,
}

impl DecayClock {
    /// A clock whose first measured span starts at `now_ms`.
    pub const fn starting_at(now_ms: u64) -> Self {
        Self { last_ms: now_ms }
    }

    /// Milliseconds since the previous call, then move the mark to `now_ms`.
    ///
    /// A `now_ms` earlier than the mark yields zero and leaves the mark.
    pub const fn elapsed(&mut self, now_ms: u64) -> u64 {
        if now_ms < self.last_ms {
            return 0;
        }
        let span = now_ms.saturating_sub(self.last_ms);
        self.last_ms = now_ms;
        span
    }

    /// Timestamp of the last decay.
    pub const fn last_ms(&self) -> u64 {
        self.last_ms
    }
}
