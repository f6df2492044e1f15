//! The agent manager: owns every pet, the resource pool, and the timers,
//! and drives the per-tick update.
//!
//! Each tick runs these steps in a fixed order:
//!
//! 1. **Clock** -- advance simulated time by the measured delta.
//! 2. **Timers** -- fire every due timer (expiry, follow-up, recovery,
//!    settle check). A timer whose entity is gone is a no-op.
//! 3. **Pets** -- for each pet: movement, then arrival handling, then the
//!    three need systems (decay, emission, throttled seek), then the idle
//!    activity timer.
//! 4. **Watchdog** -- when its period has elapsed, repair inconsistent flag
//!    combinations and stale claims.
//!
//! Removing an item always goes through [`PetManager::destroy_item`], the
//! disappearance protocol: a pet pursuing the item is stopped first and
//! re-evaluated after a short grace delay.
//!
//! # Submodules
//!
//! - [`commands`] -- The command surface and host-facing snapshots.
//! - [`watchdog`] -- Periodic invariant repair.

pub mod commands;
pub mod watchdog;

use std::collections::BTreeMap;

use petsim_agents::decay::ms_to_seconds;
use petsim_agents::{
    ActivityComponent, ActivityEvent, Arena, Movement, MovementOutcome, NeedSet, Pet,
    Reevaluation, SeekOutcome,
};
use petsim_ledger::{Inventory, LedgerError, LocalLedger, TokenLedger};
use petsim_types::{
    AgentId, ItemId, NeedKind, Notification, RemovalCause, ResourceKind, Supply,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::clock::{ClockError, SimClock};
use crate::config::SimulationConfig;
use crate::pool::{RemovedItem, ResourceItem, ResourcePool};
use crate::timers::{TimerEvent, TimerQueue};

pub use commands::CommandError;
pub use watchdog::Repair;

/// Errors that can occur during tick execution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TickError {
    /// The clock could not advance.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// Summary of one completed tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// The tick number that just ran.
    pub tick: u64,
    /// Simulated time after the tick.
    pub now_ms: u64,
    /// Pets alive after the tick.
    pub pets: usize,
    /// Live items after the tick.
    pub items: usize,
    /// Timers fired during the tick.
    pub timers_fired: usize,
    /// Repairs applied by the watchdog during the tick.
    pub repairs: usize,
}

/// One pet and the components created and destroyed with it.
#[derive(Debug, Clone)]
struct PetSlot {
    pet: Pet,
    movement: Movement,
    needs: NeedSet,
    activity: ActivityComponent,
}

/// Owner of the pet collection, the resource pool, and the timer queue.
pub struct PetManager {
    config: SimulationConfig,
    arena: Arena,
    clock: SimClock,
    pets: BTreeMap<AgentId, PetSlot>,
    active: Option<AgentId>,
    pool: ResourcePool,
    timers: TimerQueue,
    ledger: Box<dyn TokenLedger>,
    inventory: Inventory,
    notifications: Vec<Notification>,
    rng: SmallRng,
    next_watchdog_ms: u64,
}

impl std::fmt::Debug for PetManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PetManager")
            .field("clock", &self.clock)
            .field("pets", &self.pets.len())
            .field("active", &self.active)
            .field("items", &self.pool.len())
            .field("timers", &self.timers.len())
            .field("balance", &self.ledger.balance())
            .finish_non_exhaustive()
    }
}

impl PetManager {
    /// A manager with no pets, backed by the given wallet.
    pub fn new(config: SimulationConfig, ledger: Box<dyn TokenLedger>) -> Self {
        let arena = Arena::new(config.world.arena_width, config.movement.body_width);
        let rng = SmallRng::seed_from_u64(config.world.seed);
        let inventory = Inventory::new(config.economy.caps);
        let next_watchdog_ms = config.timing.watchdog_interval_ms;
        Self {
            config,
            arena,
            clock: SimClock::new(),
            pets: BTreeMap::new(),
            active: None,
            pool: ResourcePool::new(),
            timers: TimerQueue::new(),
            ledger,
            inventory,
            notifications: Vec::new(),
            rng,
            next_watchdog_ms,
        }
    }

    /// A manager backed by an in-memory ledger holding the configured
    /// starting balance.
    pub fn with_local_ledger(config: SimulationConfig) -> Self {
        let ledger = LocalLedger::new(config.economy.starting_balance);
        Self::new(config, Box::new(ledger))
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Configuration in effect.
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The arena pets and items live in.
    pub const fn arena(&self) -> &Arena {
        &self.arena
    }

    /// The simulation clock.
    pub const fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Simulated milliseconds elapsed.
    pub const fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// The resource pool (read-only).
    pub const fn pool(&self) -> &ResourcePool {
        &self.pool
    }

    /// Pending timers (read-only).
    pub const fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    /// A pet by id.
    pub fn pet(&self, id: AgentId) -> Option<&Pet> {
        self.pets.get(&id).map(|slot| &slot.pet)
    }

    /// Ids of every pet, in id order.
    pub fn pet_ids(&self) -> Vec<AgentId> {
        self.pets.keys().copied().collect()
    }

    /// Number of pets.
    pub fn pet_count(&self) -> usize {
        self.pets.len()
    }

    /// Whether a pet exists.
    pub fn has_pet(&self, id: AgentId) -> bool {
        self.pets.contains_key(&id)
    }

    /// The pet commands act on by default.
    pub const fn active_agent(&self) -> Option<AgentId> {
        self.active
    }

    /// Current wallet balance.
    pub fn balance(&self) -> Decimal {
        self.ledger.balance()
    }

    /// Held supplies.
    pub const fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Take every notification queued since the last drain.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub(crate) fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    // -----------------------------------------------------------------------
    // Authoritative overwrites
    // -----------------------------------------------------------------------

    /// Replace the wallet balance with an authoritative value.
    pub fn overwrite_balance(&mut self, balance: Decimal) -> Result<Decimal, LedgerError> {
        self.ledger.set_balance(balance)
    }

    /// Replace one inventory count with an authoritative value.
    pub fn overwrite_inventory(&mut self, supply: Supply, count: u32) {
        self.inventory.set(supply, count);
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance the simulation by `delta_ms` of measured time.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::Clock`] if simulated time would overflow; no
    /// state changes in that case.
    pub fn tick(&mut self, delta_ms: u64) -> Result<TickReport, TickError> {
        let now = self.clock.advance(delta_ms)?;

        let due = self.timers.pop_due(now);
        let timers_fired = due.len();
        for event in due {
            self.fire(event, now);
        }

        let dt_secs = ms_to_seconds(delta_ms);
        for id in self.pet_ids() {
            self.step_pet(id, now, delta_ms, dt_secs);
        }

        let mut repairs = 0_usize;
        if now >= self.next_watchdog_ms {
            repairs = self.run_watchdog().len();
            self.next_watchdog_ms = now.saturating_add(self.config.timing.watchdog_interval_ms);
        }

        Ok(TickReport {
            tick: self.clock.tick(),
            now_ms: now,
            pets: self.pets.len(),
            items: self.pool.len(),
            timers_fired,
            repairs,
        })
    }

    fn step_pet(&mut self, id: AgentId, now: u64, delta_ms: u64, dt_secs: f64) {
        let Some(slot) = self.pets.get_mut(&id) else {
            return;
        };
        let outcome = slot.movement.update(&mut slot.pet, dt_secs);
        if let MovementOutcome::ReachedTarget { item, .. } = outcome {
            self.handle_arrival(id, item, now);
        }

        self.update_needs(id, now);

        let Some(slot) = self.pets.get_mut(&id) else {
            return;
        };
        match slot.activity.update(&mut slot.pet, delta_ms, &mut self.rng) {
            ActivityEvent::Started(activity) => {
                debug!(agent = %id, activity = ?activity, "idle burst started");
            }
            ActivityEvent::Reverted => debug!(agent = %id, "idle burst ended"),
            ActivityEvent::Superseded => debug!(agent = %id, "idle burst superseded"),
            ActivityEvent::None => {}
        }
    }

    fn update_needs(&mut self, id: AgentId, now: u64) {
        let mut emissions = Vec::new();
        let mut started = None;
        {
            let Some(slot) = self.pets.get_mut(&id) else {
                return;
            };
            for kind in NeedKind::ALL {
                let system = slot.needs.get_mut(kind);
                system.update(&mut slot.pet, now);
                if let Some(emission) = system.emit(&mut slot.pet, now) {
                    emissions.push(emission);
                }
            }
            for kind in NeedKind::ALL {
                let outcome = slot
                    .needs
                    .get_mut(kind)
                    .try_seek(&mut slot.pet, &mut self.pool, now);
                if let SeekOutcome::Pursuing { item, .. } = outcome {
                    started = Some(item);
                    break;
                }
            }
        }
        if let Some(item) = started {
            self.notify(Notification::PursuitStarted { agent: id, item });
        }
        for emission in emissions {
            debug!(agent = %emission.source, kind = ?emission.kind, x = emission.x, "pet emitted an item");
            self.spawn_item(emission.kind, emission.x, Some(emission.source));
        }
    }

    /// Movement reported the pet is at its target.
    fn handle_arrival(&mut self, id: AgentId, item: ItemId, now: u64) {
        let radius = self.config.resources.interaction_radius;
        let Some(slot) = self.pets.get_mut(&id) else {
            return;
        };
        let Some(pursuit) = slot.pet.pursuit().copied() else {
            return;
        };
        if pursuit.item != item {
            return;
        }
        let Some(need) = slot.needs.seeker_of(pursuit.kind) else {
            warn!(agent = %id, item = %item, kind = ?pursuit.kind, "pursuing an item no need consumes");
            slot.pet.force_locomotion();
            self.pool.release_agent(id);
            return;
        };

        let pet_x = slot.pet.x();
        let in_reach = self
            .pool
            .get(item)
            .is_some_and(|found| (found.x - pet_x).abs() <= radius);
        if !in_reach {
            debug!(agent = %id, item = %item, "target reached but item out of reach");
            self.interrupt_pursuit(id, item, now);
            return;
        }

        let arrival = slot
            .needs
            .get_mut(need)
            .resolve_arrival(&mut slot.pet, &mut self.pool, item, now);
        self.notify(Notification::PursuitEnded { agent: id, item });
        let Some(arrival) = arrival else {
            self.schedule_recovery(id, need, now);
            return;
        };

        self.timers.cancel_for_item(item);
        self.timers.schedule(
            now.saturating_add(self.config.timing.post_consume_ms),
            TimerEvent::FollowUp { agent: id, need },
        );
        info!(agent = %id, item = %item, need = ?need, level = arrival.level, "pet consumed item");
        self.notify(Notification::ResourceRemoved {
            item,
            kind: arrival.consumed.kind,
            cause: RemovalCause::Consumed,
        });
        self.notify(Notification::Consumed {
            agent: id,
            item,
            need,
            level: arrival.level,
        });
    }

    // -----------------------------------------------------------------------
    // Timers
    // -----------------------------------------------------------------------

    fn fire(&mut self, event: TimerEvent, now: u64) {
        match event {
            TimerEvent::Expire { item } => {
                if self.destroy_item(item, RemovalCause::Expired).is_some() {
                    debug!(item = %item, "item expired");
                }
            }
            TimerEvent::FollowUp { agent, need } => self.follow_up(agent, need),
            TimerEvent::Recovery { agent, need } => self.recover(agent, need),
            TimerEvent::SettleCheck { agent } => {
                self.repair_pet(agent, now);
            }
        }
    }

    /// Post-consumption re-evaluation. A no-op if something else already
    /// moved the pet out of the resolving state.
    fn follow_up(&mut self, agent: AgentId, need: NeedKind) {
        let Some(slot) = self.pets.get_mut(&agent) else {
            return;
        };
        if slot.needs.resolving_need(&slot.pet) != Some(need) {
            return;
        }
        let result = slot
            .needs
            .get_mut(need)
            .re_evaluate(&mut slot.pet, &mut self.pool);
        self.report_reevaluation(agent, need, result);
    }

    /// Re-evaluation after a pursued item vanished.
    fn recover(&mut self, agent: AgentId, need: NeedKind) {
        let Some(slot) = self.pets.get_mut(&agent) else {
            return;
        };
        // Already pursuing again, or under an explicit non-walking command.
        if slot.pet.is_pursuing() || !slot.pet.activity().is_locomotion() {
            return;
        }
        let result = slot
            .needs
            .get_mut(need)
            .re_evaluate(&mut slot.pet, &mut self.pool);
        self.report_reevaluation(agent, need, result);
    }

    fn report_reevaluation(&mut self, agent: AgentId, need: NeedKind, result: Reevaluation) {
        match result {
            Reevaluation::Pursuing { item } => {
                debug!(agent = %agent, item = %item, need = ?need, "re-evaluation chained to next item");
                self.notify(Notification::PursuitStarted { agent, item });
            }
            Reevaluation::ReturnedToLocomotion => {
                debug!(agent = %agent, need = ?need, "re-evaluation returned pet to walking");
            }
        }
    }

    fn schedule_recovery(&mut self, agent: AgentId, need: NeedKind, now: u64) {
        self.timers.schedule(
            now.saturating_add(self.config.timing.recovery_grace_ms),
            TimerEvent::Recovery { agent, need },
        );
    }

    // -----------------------------------------------------------------------
    // Items
    // -----------------------------------------------------------------------

    /// Create an item at `x` (clamped to the arena) with its configured
    /// lifetime, announce it, and offer it to every pet.
    pub(crate) fn spawn_item(
        &mut self,
        kind: ResourceKind,
        x: f64,
        source: Option<AgentId>,
    ) -> ItemId {
        let now = self.clock.now_ms();
        let x = self.arena.clamp(x);
        let ttl = self.config.resources.ttl_for(kind);
        let item = self.pool.spawn(kind, x, now, Some(ttl), source);
        self.timers
            .schedule(now.saturating_add(ttl), TimerEvent::Expire { item });
        self.notify(Notification::ResourceAppeared { item, kind, x });
        self.offer(kind);
        item
    }

    /// Insert an item whose id the remote authority assigned. Returns
    /// `false` if the id is already live.
    pub fn insert_remote_item(
        &mut self,
        item: ItemId,
        kind: ResourceKind,
        x: f64,
        ttl_ms: u64,
    ) -> bool {
        let now = self.clock.now_ms();
        let x = self.arena.clamp(x);
        let inserted = self.pool.insert(ResourceItem {
            id: item,
            kind,
            x,
            created_at_ms: now,
            expires_at_ms: Some(now.saturating_add(ttl_ms)),
            source: None,
        });
        if !inserted {
            return false;
        }
        self.timers
            .schedule(now.saturating_add(ttl_ms), TimerEvent::Expire { item });
        self.notify(Notification::ResourceAppeared { item, kind, x });
        self.offer(kind);
        true
    }

    /// Move a live item and retarget whoever pursues it.
    pub fn move_item(&mut self, item: ItemId, x: f64) -> bool {
        let x = self.arena.clamp(x);
        if !self.pool.move_item(item, x) {
            return false;
        }
        let pursuer = self
            .pool
            .arbiter()
            .holder_of(item)
            .and_then(|holder| self.pets.get_mut(&holder))
            .filter(|slot| slot.pet.pursuit().is_some_and(|p| p.item == item));
        if let Some(slot) = pursuer {
            slot.pet.retarget(x);
        }
        true
    }

    /// Unthrottled seek for every pet with a need that pursues `kind`.
    fn offer(&mut self, kind: ResourceKind) {
        let mut started = Vec::new();
        for (id, slot) in &mut self.pets {
            let Some(need) = slot.needs.seeker_of(kind) else {
                continue;
            };
            let outcome = slot
                .needs
                .get_mut(need)
                .seek_now(&mut slot.pet, &mut self.pool);
            if let SeekOutcome::Pursuing { item, .. } = outcome {
                started.push((*id, item));
            }
        }
        for (agent, item) in started {
            self.notify(Notification::PursuitStarted { agent, item });
        }
    }

    /// Remove an item through the disappearance protocol: a pet pursuing
    /// it is stopped and scheduled for recovery, the claim is released,
    /// pending timers for the item are cancelled. Returns `None` if the
    /// item does not exist.
    pub fn destroy_item(&mut self, item: ItemId, cause: RemovalCause) -> Option<RemovedItem> {
        self.pool.get(item)?;
        let now = self.clock.now_ms();
        if let Some(holder) = self.pool.arbiter().holder_of(item) {
            self.interrupt_pursuit(holder, item, now);
        }
        let removed = self.pool.remove(item, cause)?;
        if let Some(stale) = removed.released {
            warn!(agent = %stale, item = %item, "released claim held without a pursuit");
        }
        self.timers.cancel_for_item(item);
        self.notify(Notification::ResourceRemoved {
            item,
            kind: removed.item.kind,
            cause,
        });
        Some(removed)
    }

    /// Stop `agent` pursuing `item`, release its claim, and schedule a
    /// recovery re-evaluation after the grace delay.
    fn interrupt_pursuit(&mut self, agent: AgentId, item: ItemId, now: u64) {
        let Some(slot) = self.pets.get_mut(&agent) else {
            return;
        };
        let Some(pursuit) = slot.pet.pursuit().copied() else {
            return;
        };
        if pursuit.item != item {
            return;
        }
        slot.pet.end_pursuit();
        let need = slot.needs.seeker_of(pursuit.kind);
        self.pool.release_agent(agent);
        self.notify(Notification::PursuitEnded { agent, item });
        match need {
            Some(need) => self.schedule_recovery(agent, need, now),
            None => {
                if let Some(slot) = self.pets.get_mut(&agent) {
                    slot.pet.force_locomotion();
                }
            }
        }
        debug!(agent = %agent, item = %item, "pursuit interrupted");
    }

    // -----------------------------------------------------------------------
    // Pet mutation used by reconciliation
    // -----------------------------------------------------------------------

    pub(crate) fn pet_mut(&mut self, id: AgentId) -> Option<&mut Pet> {
        self.pets.get_mut(&id).map(|slot| &mut slot.pet)
    }

    /// Move a pet to an observed position, ignoring differences within the
    /// sync threshold. Returns whether the pet moved.
    pub fn sync_position(&mut self, id: AgentId, x: f64) -> bool {
        let threshold = self.config.movement.sync_threshold;
        let x = self.arena.clamp(x);
        let Some(pet) = self.pet_mut(id) else {
            return false;
        };
        if (pet.x() - x).abs() <= threshold {
            return false;
        }
        pet.set_x(x);
        true
    }

    /// End a pet's pursuit and release its claim.
    pub fn end_pursuit_of(&mut self, id: AgentId) -> bool {
        let Some(ended) = self.pet_mut(id).and_then(Pet::end_pursuit) else {
            return false;
        };
        self.pool.release_agent(ended.agent);
        self.notify(Notification::PursuitEnded {
            agent: ended.agent,
            item: ended.item,
        });
        true
    }

    /// Point a pet at a specific item through the arbiter. Returns `false`
    /// if the pet or item is missing or someone else holds the claim.
    pub fn direct_pursuit(&mut self, id: AgentId, item: ItemId) -> bool {
        let Some((kind, x)) = self.pool.get(item).map(|found| (found.kind, found.x)) else {
            return false;
        };
        let Some(slot) = self.pets.get_mut(&id) else {
            return false;
        };
        if slot.pet.pursuit().is_some_and(|p| p.item == item) {
            return true;
        }
        if let Some(ended) = slot.pet.end_pursuit() {
            self.pool.release_agent(ended.agent);
        }
        if let Err(refused) = self.pool.try_claim(item, id) {
            debug!(agent = %id, item = %item, error = %refused, "directed pursuit refused");
            return false;
        }
        slot.pet.begin_pursuit(item, kind, x);
        self.notify(Notification::PursuitStarted { agent: id, item });
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use petsim_types::Activity;

    use super::*;

    fn manager() -> PetManager {
        PetManager::with_local_ledger(SimulationConfig::default())
    }

    fn hungry(manager: &mut PetManager, x: f64, level: f64) -> AgentId {
        let id = manager.create_agent(None, x).unwrap();
        manager
            .pet_mut(id)
            .unwrap()
            .needs_mut()
            .set(NeedKind::Hunger, level);
        id
    }

    #[test]
    fn tick_advances_clock() {
        let mut manager = manager();
        let report = manager.tick(16).unwrap();
        assert_eq!(report.tick, 1);
        assert_eq!(report.now_ms, 16);
        assert_eq!(manager.now_ms(), 16);
    }

    #[test]
    fn pet_walks_to_food_and_eats() {
        let mut manager = manager();
        let pet = hungry(&mut manager, 200.0, 50.0);
        let item = manager.purchase_and_drop(ResourceKind::Food, 300.0).unwrap();
        assert_eq!(
            manager.pet(pet).unwrap().pursuit().map(|p| p.item),
            Some(item)
        );

        for _ in 0..200 {
            manager.tick(16).unwrap();
        }
        let state = manager.pet(pet).unwrap();
        assert!(manager.pool().get(item).is_none());
        assert!(manager.pool().arbiter().is_empty());
        assert!(!state.is_pursuing());
        assert!(state.needs().hunger > 60.0);
        let notes = manager.drain_notifications();
        assert!(notes.iter().any(|n| matches!(n, Notification::Consumed { agent, .. } if *agent == pet)));
    }

    #[test]
    fn follow_up_returns_satisfied_pet_to_walking() {
        let mut manager = manager();
        let pet = hungry(&mut manager, 200.0, 70.0);
        manager.purchase_and_drop(ResourceKind::Food, 210.0).unwrap();
        manager.tick(16).unwrap();
        assert_eq!(manager.pet(pet).unwrap().activity(), Activity::Consuming);

        for _ in 0..130 {
            manager.tick(16).unwrap();
        }
        let state = manager.pet(pet).unwrap();
        assert_eq!(state.activity(), Activity::Walking);
        assert!(!state.is_externally_directed());
    }

    #[test]
    fn toy_does_not_interrupt_eating() {
        let mut manager = manager();
        let pet = hungry(&mut manager, 200.0, 70.0);
        manager.purchase_and_drop(ResourceKind::Food, 210.0).unwrap();
        manager.tick(16).unwrap();
        manager
            .pet_mut(pet)
            .unwrap()
            .needs_mut()
            .set(NeedKind::Happiness, 20.0);

        let toy = manager.purchase_and_drop(ResourceKind::Toy, 500.0).unwrap();
        manager.tick(16).unwrap();
        let state = manager.pet(pet).unwrap();
        assert_eq!(state.activity(), Activity::Consuming);
        assert!(!state.is_pursuing());
        assert!(!manager.pool().arbiter().is_claimed(toy));
    }

    #[test]
    fn expiry_removes_item_and_recovers_pursuer() {
        let mut config = SimulationConfig::default();
        config.resources.food_ttl_ms = 100;
        config.movement.speed = 1.0;
        let mut manager = PetManager::with_local_ledger(config);
        let pet = hungry(&mut manager, 100.0, 40.0);
        let item = manager.purchase_and_drop(ResourceKind::Food, 700.0).unwrap();
        assert!(manager.pet(pet).unwrap().is_pursuing());

        manager.tick(100).unwrap();
        assert!(manager.pool().get(item).is_none());
        assert!(!manager.pet(pet).unwrap().is_pursuing());
        assert!(manager.pool().arbiter().is_empty());

        manager.tick(30).unwrap();
        let state = manager.pet(pet).unwrap();
        assert_eq!(state.activity(), Activity::Walking);
        assert!(!state.is_externally_directed());
    }

    #[test]
    fn dirty_pet_leaves_waste() {
        let mut manager = manager();
        let pet = manager.create_agent(None, 400.0).unwrap();
        manager
            .pet_mut(pet)
            .unwrap()
            .needs_mut()
            .set(NeedKind::Cleanliness, 40.0);
        manager.tick(15_000).unwrap();
        let waste = manager.pool().items_of(ResourceKind::Waste);
        assert_eq!(waste.len(), 1);
        assert_eq!(waste.first().unwrap().source, Some(pet));
    }

    #[test]
    fn moving_item_retargets_pursuer() {
        let mut manager = manager();
        let pet = hungry(&mut manager, 100.0, 40.0);
        let item = manager.purchase_and_drop(ResourceKind::Food, 600.0).unwrap();
        assert!(manager.move_item(item, 500.0));
        let target = manager.pet(pet).unwrap().pursuit().map(|p| p.x);
        assert_eq!(target.map(|x| (x - 500.0).abs() < f64::EPSILON), Some(true));
    }

    #[test]
    fn sync_position_ignores_small_drift() {
        let mut manager = manager();
        let pet = manager.create_agent(None, 300.0).unwrap();
        assert!(!manager.sync_position(pet, 303.0));
        assert!(manager.sync_position(pet, 320.0));
        assert!((manager.pet(pet).unwrap().x() - 320.0).abs() < f64::EPSILON);
    }
}
