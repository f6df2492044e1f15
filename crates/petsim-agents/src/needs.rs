//! Need systems: feeding, cleanliness, and happiness.
//!
//! The three systems share one shape and differ only in [`NeedConfig`]:
//!
//! - **Decay**: the level drops at a per-hour rate over the elapsed delta.
//! - **Seeking**: below threshold, the pet claims the nearest unclaimed
//!   item of the sought kind through the [`ResourceHost`] and pursues it.
//!   Attempts are throttled.
//! - **Arrival**: the claim is released, the item consumed, the level
//!   replenished, and the pet enters the resolving activity. The caller
//!   schedules the follow-up re-evaluation.
//! - **Emission**: a need may spontaneously drop an item (waste) while low.

use petsim_types::{AgentId, ItemId, MAX_NEED, NeedKind, ResourceKind};
use tracing::debug;

use crate::config::NeedConfig;
use crate::decay::{DecayClock, decayed_level};
use crate::host::{ConsumedItem, ResourceHost};
use crate::pet::Pet;

/// Result of a seek attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeekOutcome {
    /// This need does not pursue resources.
    NotSeeking,
    /// The level is at or above threshold.
    Satisfied,
    /// The pet is already pursuing or resolving.
    Busy,
    /// The last attempt was too recent.
    Throttled,
    /// No unclaimed item of the sought kind exists.
    NothingAvailable,
    /// Another pet won the claim.
    Contended,
    /// The claim was granted and the pursuit started.
    Pursuing {
        /// The claimed item.
        item: ItemId,
        /// Its position.
        x: f64,
    },
}

/// What the post-consumption or recovery re-evaluation decided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reevaluation {
    /// The pet claimed another item.
    Pursuing {
        /// The claimed item.
        item: ItemId,
    },
    /// The pet returned to default locomotion.
    ReturnedToLocomotion,
}

/// A resolved arrival.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrivalOutcome {
    /// The need that was replenished.
    pub need: NeedKind,
    /// The consumed item.
    pub consumed: ConsumedItem,
    /// Level after replenishment.
    pub level: f64,
}

/// An item a need wants dropped at the pet's position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emission {
    /// The pet producing it.
    pub source: AgentId,
    /// Kind of item.
    pub kind: ResourceKind,
    /// Where to drop it.
    pub x: f64,
}

/// One need axis of one pet.
#[derive(Debug, Clone, PartialEq)]
pub struct NeedSystem {
    kind: NeedKind,
    config: NeedConfig,
    decay: DecayClock,
    last_seek_ms: Option<u64>,
    last_emission_ms: u64,
}

impl NeedSystem {
    /// A need system whose decay and emission clocks start at `now_ms`.
    pub const fn new(kind: NeedKind, config: NeedConfig, now_ms: u64) -> Self {
        Self {
            kind,
            config,
            decay: DecayClock::starting_at(now_ms),
            last_seek_ms: None,
            last_emission_ms: now_ms,
        }
    }

    /// The need axis.
    pub const fn kind(&self) -> NeedKind {
        self.kind
    }

    /// Parameters in effect.
    pub const fn config(&self) -> &NeedConfig {
        &self.config
    }

    /// Decay the pet's level to `now_ms`. Returns the new level.
    pub fn update(&mut self, pet: &mut Pet, now_ms: u64) -> f64 {
        let elapsed = self.decay.elapsed(now_ms);
        let current = pet.needs().get(self.kind);
        if elapsed == 0 {
            return current;
        }
        let level = decayed_level(current, self.config.decay_per_hour, elapsed);
        pet.needs_mut().set(self.kind, level)
    }

    /// Whether the level is below the seek threshold.
    pub fn below_threshold(&self, pet: &Pet) -> bool {
        pet.needs().get(self.kind) < self.config.threshold
    }

    /// Whether the pet is currently in this need's resolving activity.
    pub fn is_resolving(&self, pet: &Pet) -> bool {
        pet.resolving().is_some() && pet.activity() == self.config.resolving_activity
    }

    /// Whether a seek would be attempted right now (ignoring throttling
    /// and availability).
    pub fn wants_resource(&self, pet: &Pet) -> bool {
        self.config.seeks.is_some()
            && self.below_threshold(pet)
            && !pet.is_pursuing()
            && pet.activity() != self.config.resolving_activity
    }

    /// Throttled seek, run every tick.
    pub fn try_seek(
        &mut self,
        pet: &mut Pet,
        host: &mut dyn ResourceHost,
        now_ms: u64,
    ) -> SeekOutcome {
        if let Some(outcome) = self.precheck(pet) {
            return outcome;
        }
        if let Some(last) = self.last_seek_ms {
            if now_ms.saturating_sub(last) < self.config.seek_interval_ms {
                return SeekOutcome::Throttled;
            }
        }
        self.last_seek_ms = Some(now_ms);
        self.claim_nearest(pet, host)
    }

    /// Unthrottled seek, run when a new item appears.
    pub fn seek_now(&mut self, pet: &mut Pet, host: &mut dyn ResourceHost) -> SeekOutcome {
        if let Some(outcome) = self.precheck(pet) {
            return outcome;
        }
        self.claim_nearest(pet, host)
    }

    fn precheck(&self, pet: &Pet) -> Option<SeekOutcome> {
        if self.config.seeks.is_none() {
            return Some(SeekOutcome::NotSeeking);
        }
        if !self.below_threshold(pet) {
            return Some(SeekOutcome::Satisfied);
        }
        if pet.is_pursuing()
            || pet.resolving().is_some()
            || pet.activity() == self.config.resolving_activity
        {
            return Some(SeekOutcome::Busy);
        }
        None
    }

    fn claim_nearest(&self, pet: &mut Pet, host: &mut dyn ResourceHost) -> SeekOutcome {
        let Some(kind) = self.config.seeks else {
            return SeekOutcome::NotSeeking;
        };
        let Some((item, x)) = host.nearest_unclaimed(kind, pet.x()) else {
            return SeekOutcome::NothingAvailable;
        };
        if !host.claim(item, pet.id()) {
            return SeekOutcome::Contended;
        }
        pet.begin_pursuit(item, kind, x);
        debug!(agent = %pet.id(), item = %item, need = ?self.kind, x, "pursuit started");
        SeekOutcome::Pursuing { item, x }
    }

    /// Resolve a "target reached" signal for an item this need pursues.
    ///
    /// Releases the claim, consumes the item, replenishes the level, and
    /// enters the resolving activity. Returns `None` (with the pursuit
    /// ended and the claim released) when the item no longer exists.
    pub fn resolve_arrival(
        &mut self,
        pet: &mut Pet,
        host: &mut dyn ResourceHost,
        item: ItemId,
        now_ms: u64,
    ) -> Option<ArrivalOutcome> {
        if let Some(ended) = pet.end_pursuit() {
            host.release(ended.agent);
        }
        let consumed = host.consume(item)?;
        let level = self.replenish(pet, self.config.restore);
        pet.begin_resolving(self.kind, self.config.resolving_activity, now_ms);
        debug!(agent = %pet.id(), item = %item, need = ?self.kind, level, "item consumed");
        Some(ArrivalOutcome {
            need: self.kind,
            consumed,
            level,
        })
    }

    /// Add `amount` to the level, capped at 100. Returns the new level.
    pub fn replenish(&self, pet: &mut Pet, amount: f64) -> f64 {
        let current = pet.needs().get(self.kind);
        pet.needs_mut()
            .set(self.kind, (current + amount.max(0.0)).min(MAX_NEED))
    }

    /// Decide what a pet does after resolving or losing its target: claim
    /// another item if still below threshold, else return to locomotion.
    ///
    /// Any claim the pet still holds is released through `host` first.
    pub fn re_evaluate(&mut self, pet: &mut Pet, host: &mut dyn ResourceHost) -> Reevaluation {
        if let Some(ended) = pet.end_pursuit() {
            host.release(ended.agent);
        }
        if self.config.seeks.is_some() && self.below_threshold(pet) {
            if let SeekOutcome::Pursuing { item, .. } = self.claim_nearest(pet, host) {
                return Reevaluation::Pursuing { item };
            }
        }
        pet.force_locomotion();
        Reevaluation::ReturnedToLocomotion
    }

    /// Spontaneous emission check, throttled by the emission interval.
    pub fn emit(&mut self, pet: &mut Pet, now_ms: u64) -> Option<Emission> {
        let emission = self.config.emission.as_ref()?;
        if !self.below_threshold(pet) || pet.is_pursuing() || pet.resolving().is_some() {
            return None;
        }
        if now_ms.saturating_sub(self.last_emission_ms) < emission.interval_ms {
            return None;
        }
        self.last_emission_ms = now_ms;
        let current = pet.needs().get(self.kind);
        pet.needs_mut().set(self.kind, current - emission.cost);
        Some(Emission {
            source: pet.id(),
            kind: emission.kind,
            x: pet.x(),
        })
    }
}

/// The three need systems of one pet.
#[derive(Debug, Clone, PartialEq)]
pub struct NeedSet {
    hunger: NeedSystem,
    cleanliness: NeedSystem,
    happiness: NeedSystem,
}

impl NeedSet {
    /// Build all three systems from their configs.
    pub fn new(configs: &crate::config::NeedsConfig, now_ms: u64) -> Self {
        Self {
            hunger: NeedSystem::new(NeedKind::Hunger, configs.hunger.clone(), now_ms),
            cleanliness: NeedSystem::new(
                NeedKind::Cleanliness,
                configs.cleanliness.clone(),
                now_ms,
            ),
            happiness: NeedSystem::new(NeedKind::Happiness, configs.happiness.clone(), now_ms),
        }
    }

    /// One system by axis.
    pub const fn get(&self, kind: NeedKind) -> &NeedSystem {
        match kind {
            NeedKind::Hunger => &self.hunger,
            NeedKind::Cleanliness => &self.cleanliness,
            NeedKind::Happiness => &self.happiness,
        }
    }

    /// One system by axis, mutably.
    pub const fn get_mut(&mut self, kind: NeedKind) -> &mut NeedSystem {
        match kind {
            NeedKind::Hunger => &mut self.hunger,
            NeedKind::Cleanliness => &mut self.cleanliness,
            NeedKind::Happiness => &mut self.happiness,
        }
    }

    /// The system that pursues `kind`, if any.
    pub fn seeker_of(&self, kind: ResourceKind) -> Option<NeedKind> {
        NeedKind::ALL
            .into_iter()
            .find(|need| self.get(*need).config().seeks == Some(kind))
    }

    /// The need whose resolving state the pet is in, if any.
    pub fn resolving_need(&self, pet: &Pet) -> Option<NeedKind> {
        pet.resolving()
            .map(|r| r.need)
            .filter(|need| self.get(*need).is_resolving(pet))
    }
}
