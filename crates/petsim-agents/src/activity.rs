//! Autonomous idle bursts layered on top of walking.
//!
//! A countdown, redrawn uniformly from `[min_idle_ms, max_idle_ms]` after
//! every burst, runs only while the pet walks undirected. When it elapses
//! the pet sleeps or plays for `idle_duration_ms`, then walks again. Any
//! external direction (a command or a pursuit) cancels the burst and
//! freezes the countdown.

use petsim_types::Activity;
use rand::Rng;

use crate::config::ActivityConfig;
use crate::pet::Pet;

/// What an activity step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityEvent {
    /// Nothing changed.
    None,
    /// An idle burst started.
    Started(Activity),
    /// An idle burst ended and the pet walks again.
    Reverted,
    /// A burst was cut short by something else taking over.
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IdleBurst {
    activity: Activity,
    remaining_ms: u64,
}

/// Idle-activity timer owned one-to-one by each pet slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityComponent {
    config: ActivityConfig,
    countdown_ms: u64,
    burst: Option<IdleBurst>,
}

impl ActivityComponent {
    /// A component with a freshly drawn countdown.
    pub fn new<R: Rng + ?Sized>(config: ActivityConfig, rng: &mut R) -> Self {
        let countdown_ms = draw_countdown(&config, rng);
        Self {
            config,
            countdown_ms,
            burst: None,
        }
    }

    /// Milliseconds of undirected walking left before the next burst.
    pub const fn countdown_ms(&self) -> u64 {
        self.countdown_ms
    }

    /// Whether an idle burst is running.
    pub const fn in_burst(&self) -> bool {
        self.burst.is_some()
    }

    /// Advance by `delta_ms`.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        pet: &mut Pet,
        delta_ms: u64,
        rng: &mut R,
    ) -> ActivityEvent {
        if let Some(burst) = self.burst.as_mut() {
            if pet.activity() != burst.activity || pet.is_externally_directed() {
                self.burst = None;
                return ActivityEvent::Superseded;
            }
            burst.remaining_ms = burst.remaining_ms.saturating_sub(delta_ms);
            if burst.remaining_ms > 0 {
                return ActivityEvent::None;
            }
            self.burst = None;
            pet.set_activity(Activity::DEFAULT_LOCOMOTION);
            return ActivityEvent::Reverted;
        }

        if pet.is_externally_directed() || !pet.activity().is_locomotion() {
            return ActivityEvent::None;
        }

        self.countdown_ms = self.countdown_ms.saturating_sub(delta_ms);
        if self.countdown_ms > 0 {
            return ActivityEvent::None;
        }
        self.countdown_ms = draw_countdown(&self.config, rng);

        let choices = &self.config.idle_choices;
        if choices.is_empty() {
            return ActivityEvent::None;
        }
        let index = rng.random_range(0..choices.len());
        let Some(activity) = choices.get(index).copied() else {
            return ActivityEvent::None;
        };
        if activity.is_locomotion() {
            return ActivityEvent::None;
        }
        pet.set_activity(activity);
        self.burst = Some(IdleBurst {
            activity,
            remaining_ms: self.config.idle_duration_ms,
        });
        ActivityEvent::Started(activity)
    }
}

fn draw_countdown<R: Rng + ?Sized>(config: &ActivityConfig, rng: &mut R) -> u64 {
    if config.max_idle_ms <= config.min_idle_ms {
        return config.min_idle_ms;
    }
    rng.random_range(config.min_idle_ms..=config.max_idle_ms)
}
