//! Simulation clock.
//!
//! The clock is the single source of truth for simulated time. It advances
//! by the measured wall-clock delta of each tick (not a fixed step), so all
//! time-based behaviour downstream is frame-rate independent. Timestamps
//! are milliseconds since the simulation started.
//!
//! All advancement uses checked arithmetic (no silent overflow).

/// Errors that can occur during clock operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// Simulated time would overflow.
    #[error("simulated time overflow at {now_ms} ms + {delta_ms} ms")]
    TimeOverflow {
        /// Time before the failed advance.
        now_ms: u64,
        /// The rejected delta.
        delta_ms: u64,
    },
}

/// Simulated time and tick counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimClock {
    /// Ticks completed (0 before the first tick).
    tick: u64,
    /// Simulated milliseconds elapsed.
    now_ms: u64,
}

impl SimClock {
    /// A clock at tick 0, time 0.
    pub const fn new() -> Self {
        Self { tick: 0, now_ms: 0 }
    }

    /// Restore a clock from explicit parts (tests, snapshots).
    pub const fn from_parts(tick: u64, now_ms: u64) -> Self {
        Self { tick, now_ms }
    }

    /// Advance one tick covering `delta_ms` of simulated time. Returns the
    /// new time.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] or [`ClockError::TimeOverflow`]
    /// if a counter would exceed `u64::MAX`. The clock is unchanged on error.
    pub fn advance(&mut self, delta_ms: u64) -> Result<u64, ClockError> {
        let tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        let now_ms = self
            .now_ms
            .checked_add(delta_ms)
            .ok_or(ClockError::TimeOverflow {
                now_ms: self.now_ms,
                delta_ms,
            })?;
        self.tick = tick;
        self.now_ms = now_ms;
        Ok(now_ms)
    }

    /// Ticks completed.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated milliseconds elapsed.
    pub const fn now_ms(&self) -> u64 {
        self.now_ms
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn clock_starts_at_zero() {
        let clock = SimClock::new();
        assert_eq!(clock.tick(), 0);
        assert_eq!(clock.now_ms(), 0);
    }

    #[test]
    fn clock_advances_by_delta() {
        let mut clock = SimClock::new();
        assert_eq!(clock.advance(16).unwrap(), 16);
        assert_eq!(clock.advance(17).unwrap(), 33);
        assert_eq!(clock.tick(), 2);
    }

    #[test]
    fn zero_delta_still_counts_a_tick() {
        let mut clock = SimClock::new();
        clock.advance(0).unwrap();
        assert_eq!(clock.tick(), 1);
        assert_eq!(clock.now_ms(), 0);
    }

    #[test]
    fn overflow_leaves_clock_untouched() {
        let mut clock = SimClock::from_parts(5, u64::MAX - 1);
        assert_eq!(
            clock.advance(2),
            Err(ClockError::TimeOverflow {
                now_ms: u64::MAX - 1,
                delta_ms: 2,
            })
        );
        assert_eq!(clock.tick(), 5);

        let mut clock = SimClock::from_parts(u64::MAX, 0);
        assert_eq!(clock.advance(1), Err(ClockError::TickOverflow));
    }
}
