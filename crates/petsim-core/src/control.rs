//! Shared run control state for the tick loop.
//!
//! The host holds an [`Arc<RunControl>`](std::sync::Arc) alongside the
//! runner task and uses it to pause, resume, change the tick rate, or stop
//! the loop without touching simulation state. Every field is atomic so the
//! loop reads them without locking.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::{Mutex, Notify};

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEndReason {
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
    /// The host requested a stop.
    StopRequested,
    /// Every input sender was dropped.
    InputClosed,
}

/// Shared control state for one run.
#[derive(Debug)]
pub struct RunControl {
    /// Whether the loop is paused.
    paused: AtomicBool,

    /// Wakes the loop when resumed.
    resume_notify: Notify,

    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Sleep between ticks, runtime-adjustable.
    tick_interval_ms: AtomicU64,

    /// Maximum number of ticks (0 = unlimited).
    max_ticks: u64,

    /// Why the run ended, once it has.
    end_reason: Mutex<Option<RunEndReason>>,
}

impl RunControl {
    /// Control state for a run ticking every `tick_interval_ms`.
    pub fn new(tick_interval_ms: u64, max_ticks: u64) -> Self {
        Self {
            paused: AtomicBool::new(false),
            resume_notify: Notify::new(),
            stop_requested: AtomicBool::new(false),
            tick_interval_ms: AtomicU64::new(tick_interval_ms),
            max_ticks,
            end_reason: Mutex::new(None),
        }
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Whether the loop is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Pause the loop before its next tick.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume the loop and wake it.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Wait until the loop is no longer paused.
    pub async fn wait_if_paused(&self) {
        while self.paused.load(Ordering::Acquire) {
            self.resume_notify.notified().await;
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Ask the loop to stop before its next tick.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Record why the run ended.
    pub async fn set_end_reason(&self, reason: RunEndReason) {
        *self.end_reason.lock().await = Some(reason);
    }

    /// Why the run ended, if it has.
    pub async fn end_reason(&self) -> Option<RunEndReason> {
        *self.end_reason.lock().await
    }

    // -----------------------------------------------------------------------
    // Tick rate and bounds
    // -----------------------------------------------------------------------

    /// Current sleep between ticks.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Change the sleep between ticks. Returns the previous interval, or
    /// `None` if `ms` is zero.
    pub fn set_tick_interval_ms(&self, ms: u64) -> Option<u64> {
        if ms == 0 {
            return None;
        }
        Some(self.tick_interval_ms.swap(ms, Ordering::AcqRel))
    }

    /// Configured tick limit.
    pub const fn max_ticks(&self) -> u64 {
        self.max_ticks
    }

    /// Whether `current_tick` has reached a non-zero tick limit.
    pub const fn tick_limit_reached(&self, current_tick: u64) -> bool {
        self.max_ticks > 0 && current_tick >= self.max_ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_running() {
        let control = RunControl::new(16, 0);
        assert!(!control.is_paused());
        assert!(!control.is_stop_requested());
    }

    #[test]
    fn pause_and_resume() {
        let control = RunControl::new(16, 0);
        control.pause();
        assert!(control.is_paused());
        control.resume();
        assert!(!control.is_paused());
    }

    #[test]
    fn interval_rejects_zero() {
        let control = RunControl::new(16, 0);
        assert_eq!(control.set_tick_interval_ms(0), None);
        assert_eq!(control.set_tick_interval_ms(33), Some(16));
        assert_eq!(control.tick_interval_ms(), 33);
    }

    #[test]
    fn zero_limit_is_unbounded() {
        assert!(!RunControl::new(16, 0).tick_limit_reached(u64::MAX));
        let bounded = RunControl::new(16, 10);
        assert!(!bounded.tick_limit_reached(9));
        assert!(bounded.tick_limit_reached(10));
    }

    #[tokio::test]
    async fn end_reason_is_recorded() {
        let control = RunControl::new(16, 0);
        assert_eq!(control.end_reason().await, None);
        control.set_end_reason(RunEndReason::StopRequested).await;
        assert_eq!(control.end_reason().await, Some(RunEndReason::StopRequested));
    }
}
