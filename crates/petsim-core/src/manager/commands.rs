//! The command surface and host-facing snapshots.
//!
//! Every command returns an explicit result. Insufficient funds and full
//! inventory lines are reported both as an error to the caller and as a
//! transient [`Notification`] for the host UI; neither mutates anything.

use petsim_agents::pet::check_position;
use petsim_agents::{ActivityComponent, AgentError, Movement, NeedSet, Pet};
use petsim_ledger::LedgerError;
use petsim_types::{
    Activity, AgentId, Command, CommandOutcome, ItemId, NeedKind, Notification, PetSnapshot,
    PetStats, RemovalCause, ResourceKind, ResourceSnapshot, Stats, Supply,
};
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::{PetManager, PetSlot};
use crate::timers::TimerEvent;

/// Errors returned by the command surface.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    /// No pet with this id exists.
    #[error("pet {agent} not found")]
    PetNotFound {
        /// The requested pet.
        agent: AgentId,
    },

    /// A pet with this id already exists.
    #[error("pet {agent} already exists")]
    DuplicatePet {
        /// The requested id.
        agent: AgentId,
    },

    /// The command needs an active pet and there is none.
    #[error("no active pet")]
    NoActivePet,

    /// The wallet does not cover the price.
    #[error("insufficient balance for {supply:?}: price {price}, balance {balance}")]
    InsufficientBalance {
        /// What was being bought.
        supply: Supply,
        /// Its price.
        price: Decimal,
        /// The balance at the time.
        balance: Decimal,
    },

    /// The inventory line is at its cap.
    #[error("inventory full for {supply:?} (cap {cap})")]
    InventoryFull {
        /// The full supply line.
        supply: Supply,
        /// Its cap.
        cap: u32,
    },

    /// This kind of item cannot be bought and dropped.
    #[error("{kind:?} cannot be dropped")]
    NotDroppable {
        /// The requested kind.
        kind: ResourceKind,
    },

    /// A supplied value failed validation.
    #[error("invalid argument: {source}")]
    Invalid {
        /// The underlying validation error.
        #[from]
        source: AgentError,
    },

    /// The wallet or inventory refused an operation.
    #[error("ledger error: {source}")]
    Ledger {
        /// The underlying ledger error.
        #[from]
        source: LedgerError,
    },
}

impl PetManager {
    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Create a walking pet with full needs at `x` (clamped to the arena).
    /// The first pet created becomes the active pet.
    pub fn create_agent(&mut self, id: Option<AgentId>, x: f64) -> Result<AgentId, CommandError> {
        let x = check_position(x)?;
        let id = id.unwrap_or_default();
        if self.pets.contains_key(&id) {
            return Err(CommandError::DuplicatePet { agent: id });
        }
        let now = self.clock.now_ms();
        let x = self.arena.clamp(x);
        let slot = PetSlot {
            pet: Pet::new(id, x, self.config.movement.speed),
            movement: Movement::new(&self.config.movement, self.arena),
            needs: NeedSet::new(&self.config.needs, now),
            activity: ActivityComponent::new(self.config.activity.clone(), &mut self.rng),
        };
        self.pets.insert(id, slot);
        info!(agent = %id, x, "pet created");
        self.notify(Notification::AgentCreated { agent: id });
        if self.active.is_none() {
            self.active = Some(id);
            self.notify(Notification::ActiveAgentChanged { agent: Some(id) });
        }
        Ok(id)
    }

    /// Remove a pet: its claim is released, its timers cancelled, and the
    /// active pointer handed to the first remaining pet if needed.
    pub fn remove_agent(&mut self, id: AgentId) -> Result<(), CommandError> {
        let slot = self
            .pets
            .remove(&id)
            .ok_or(CommandError::PetNotFound { agent: id })?;
        if let Some(item) = self.pool.release_agent(id) {
            self.notify(Notification::PursuitEnded { agent: id, item });
        }
        self.timers.cancel_for_agent(id);
        info!(agent = %id, x = slot.pet.x(), "pet removed");
        self.notify(Notification::AgentRemoved { agent: id });
        if self.active == Some(id) {
            self.active = self.pets.keys().next().copied();
            self.notify(Notification::ActiveAgentChanged { agent: self.active });
        }
        Ok(())
    }

    /// Point the command surface at a pet.
    pub fn set_active_agent(&mut self, id: AgentId) -> Result<(), CommandError> {
        if !self.pets.contains_key(&id) {
            return Err(CommandError::PetNotFound { agent: id });
        }
        if self.active != Some(id) {
            self.active = Some(id);
            self.notify(Notification::ActiveAgentChanged { agent: Some(id) });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Purchases and tools
    // -----------------------------------------------------------------------

    /// Drop one unit of food or toy at `x`, from inventory if one is held,
    /// otherwise bought first. The item is offered to every pet at once.
    pub fn purchase_and_drop(&mut self, kind: ResourceKind, x: f64) -> Result<ItemId, CommandError> {
        let supply = droppable_supply(kind)?;
        let x = check_position(x)?;
        self.acquire(supply)?;
        self.inventory.take(supply)?;
        Ok(self.spawn_item(kind, x, None))
    }

    /// Drop food or a toy at `x` without touching balance or inventory.
    /// Used when a remote authority owns those counters and accounts for
    /// the unit itself.
    pub fn drop_unaccounted(&mut self, kind: ResourceKind, x: f64) -> Result<ItemId, CommandError> {
        droppable_supply(kind)?;
        let x = check_position(x)?;
        Ok(self.spawn_item(kind, x, None))
    }

    /// Use the cleanup tool at a point: removes the nearest waste within
    /// reach and replenishes the cleanliness of the pet that left it (or of
    /// the active pet). Returns `None` when nothing is in reach, in which
    /// case no tool is used or bought.
    pub fn use_cleanup_tool(&mut self, x: f64, _y: f64) -> Result<Option<ItemId>, CommandError> {
        let x = check_position(x)?;
        let Some(item) = self.waste_in_reach(x) else {
            return Ok(None);
        };
        self.acquire(Supply::CleaningTool)?;
        self.inventory.take(Supply::CleaningTool)?;
        Ok(Some(self.clean_up(item)))
    }

    /// Clean up the waste nearest `x` without touching balance or
    /// inventory. Returns `None` when nothing is in reach.
    pub fn clean_unaccounted(&mut self, x: f64) -> Result<Option<ItemId>, CommandError> {
        let x = check_position(x)?;
        Ok(self.waste_in_reach(x).map(|item| self.clean_up(item)))
    }

    /// The waste item the cleanup tool would hit at `x`. Reports
    /// "nothing to clean" when there is none.
    fn waste_in_reach(&mut self, x: f64) -> Option<ItemId> {
        let radius = self.config.resources.interaction_radius;
        let item = self
            .pool
            .find_nearest_within(ResourceKind::Waste, x, radius)
            .map(|found| found.id);
        if item.is_none() {
            self.notify(Notification::NothingToClean { x });
        }
        item
    }

    fn clean_up(&mut self, item: ItemId) -> ItemId {
        let source = self
            .destroy_item(item, RemovalCause::CleanedUp)
            .and_then(|removed| removed.item.source);
        let owner = source
            .filter(|pet| self.pets.contains_key(pet))
            .or(self.active);
        let restore = self.config.needs.cleanliness.restore;
        if let Some(slot) = owner.and_then(|pet| self.pets.get_mut(&pet)) {
            let level = slot
                .needs
                .get(NeedKind::Cleanliness)
                .replenish(&mut slot.pet, restore);
            info!(agent = %slot.pet.id(), item = %item, level, "waste cleaned up");
        }
        item
    }

    /// Drop a toy at a point.
    pub fn use_toy(&mut self, x: f64, _y: f64) -> Result<ItemId, CommandError> {
        self.purchase_and_drop(ResourceKind::Toy, x)
    }

    /// Make sure one unit of `supply` is held, buying it if necessary.
    fn acquire(&mut self, supply: Supply) -> Result<(), CommandError> {
        if self.inventory.has(supply) {
            return Ok(());
        }
        self.buy(supply)
    }

    /// Buy one unit of `supply` into the inventory. The cap and balance are
    /// checked before anything is spent.
    pub fn buy(&mut self, supply: Supply) -> Result<(), CommandError> {
        if self.inventory.is_full(supply) {
            let cap = self.inventory.caps().cap(supply);
            self.notify(Notification::InventoryFull { supply, cap });
            return Err(CommandError::InventoryFull { supply, cap });
        }
        let price = self.config.economy.prices.price(supply);
        let balance = self.ledger.balance();
        if balance < price {
            self.notify(Notification::InsufficientBalance {
                supply,
                price,
                balance,
            });
            return Err(CommandError::InsufficientBalance {
                supply,
                price,
                balance,
            });
        }
        self.ledger.try_spend(price, purchase_reason(supply))?;
        if let Err(refused) = self.inventory.add(supply) {
            if let Err(refund) = self.ledger.credit(price, "refund: inventory refused") {
                warn!(error = %refund, "refund failed after inventory refusal");
            }
            return Err(refused.into());
        }
        info!(supply = ?supply, price = %price, "supply bought");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Direction
    // -----------------------------------------------------------------------

    /// Explicitly set a pet's activity (the active pet when `agent` is
    /// `None`). Any pursuit is abandoned and its claim released.
    pub fn direct_activity(
        &mut self,
        agent: Option<AgentId>,
        activity: Activity,
    ) -> Result<AgentId, CommandError> {
        let id = agent.or(self.active).ok_or(CommandError::NoActivePet)?;
        let slot = self
            .pets
            .get_mut(&id)
            .ok_or(CommandError::PetNotFound { agent: id })?;
        if let Some(ended) = slot.pet.set_directed_activity(activity) {
            self.pool.release_agent(ended.agent);
            self.notify(Notification::PursuitEnded {
                agent: ended.agent,
                item: ended.item,
            });
        }
        Ok(id)
    }

    /// Force every pet back to walking, drop every claim, cancel every
    /// pending pet timer, and schedule a settle check per pet. Returns the
    /// number of pets reset.
    pub fn force_reset_all(&mut self) -> u32 {
        let now = self.clock.now_ms();
        for slot in self.pets.values_mut() {
            slot.pet.force_locomotion();
        }
        let cleared = self.pool.clear_claims();
        self.timers.cancel_where(|event| event.agent().is_some());
        let settle_at = now.saturating_add(self.config.timing.settle_ms);
        for id in self.pet_ids() {
            self.timers
                .schedule(settle_at, TimerEvent::SettleCheck { agent: id });
        }
        for (item, agent) in cleared {
            self.notify(Notification::PursuitEnded { agent, item });
        }
        let count = u32::try_from(self.pets.len()).unwrap_or(u32::MAX);
        warn!(pets = count, "forced reset of every pet");
        count
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Run one command from the UI or CLI layer.
    pub fn execute(&mut self, command: Command) -> Result<CommandOutcome, CommandError> {
        match command {
            Command::CreateAgent { id, x } => self
                .create_agent(id, x)
                .map(|agent| CommandOutcome::AgentCreated { agent }),
            Command::RemoveAgent { agent } => self
                .remove_agent(agent)
                .map(|()| CommandOutcome::AgentRemoved { agent }),
            Command::SetActiveAgent { agent } => self
                .set_active_agent(agent)
                .map(|()| CommandOutcome::ActiveAgentSet { agent }),
            Command::PurchaseAndDrop { kind, x } => self
                .purchase_and_drop(kind, x)
                .map(|item| CommandOutcome::Dropped { item }),
            Command::UseCleanupTool { x, y } => {
                self.use_cleanup_tool(x, y).map(|cleaned| {
                    cleaned.map_or(CommandOutcome::NothingToClean, |item| {
                        CommandOutcome::Cleaned { item }
                    })
                })
            }
            Command::UseToy { x, y } => self
                .use_toy(x, y)
                .map(|item| CommandOutcome::Dropped { item }),
            Command::DirectActivity { agent, activity } => self
                .direct_activity(agent, activity)
                .map(|agent| CommandOutcome::ActivityDirected { agent }),
            Command::ForceResetAll => Ok(CommandOutcome::Reset {
                agents: self.force_reset_all(),
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    /// Draw-call view of one pet.
    pub fn agent_snapshot(&self, id: AgentId) -> Option<PetSnapshot> {
        self.pets
            .get(&id)
            .map(|slot| slot.pet.snapshot(self.active == Some(id)))
    }

    /// Draw-call view of every pet.
    pub fn agent_snapshots(&self) -> Vec<PetSnapshot> {
        self.pets
            .iter()
            .map(|(id, slot)| slot.pet.snapshot(self.active == Some(*id)))
            .collect()
    }

    /// Draw-call view of every live item.
    pub fn resource_snapshot(&self) -> Vec<ResourceSnapshot> {
        self.pool.snapshot()
    }

    /// Per-pet need levels, inventory counts, and balance.
    pub fn get_stats(&self) -> Stats {
        let pets = self
            .pets
            .values()
            .map(|slot| {
                let needs = *slot.pet.needs();
                PetStats {
                    id: slot.pet.id(),
                    activity: slot.pet.activity(),
                    needs,
                    hunger_band: needs.band(NeedKind::Hunger),
                    cleanliness_band: needs.band(NeedKind::Cleanliness),
                    happiness_band: needs.band(NeedKind::Happiness),
                }
            })
            .collect();
        Stats {
            active: self.active,
            pets,
            inventory: self.inventory.counts(),
            balance: self.ledger.balance(),
        }
    }
}

/// The supply line behind a droppable item kind.
fn droppable_supply(kind: ResourceKind) -> Result<Supply, CommandError> {
    kind.supply()
        .filter(|supply| supply.drops() == Some(kind))
        .ok_or(CommandError::NotDroppable { kind })
}

const fn purchase_reason(supply: Supply) -> &'static str {
    match supply {
        Supply::Food => "purchase: food",
        Supply::CleaningTool => "purchase: cleaning tool",
        Supply::Toy => "purchase: toy",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use petsim_types::NeedBand;

    use super::*;
    use crate::config::SimulationConfig;

    fn manager() -> PetManager {
        PetManager::with_local_ledger(SimulationConfig::default())
    }

    #[test]
    fn first_pet_becomes_active() {
        let mut manager = manager();
        let first = manager.create_agent(None, 100.0).unwrap();
        let second = manager.create_agent(None, 200.0).unwrap();
        assert_eq!(manager.active_agent(), Some(first));
        manager.set_active_agent(second).unwrap();
        assert_eq!(manager.active_agent(), Some(second));
    }

    #[test]
    fn duplicate_id_is_refused() {
        let mut manager = manager();
        let id = AgentId::new();
        manager.create_agent(Some(id), 100.0).unwrap();
        assert_eq!(
            manager.create_agent(Some(id), 200.0),
            Err(CommandError::DuplicatePet { agent: id })
        );
        assert_eq!(manager.pet_count(), 1);
    }

    #[test]
    fn creation_clamps_to_arena() {
        let mut manager = manager();
        let id = manager.create_agent(None, -500.0).unwrap();
        let x = manager.pet(id).unwrap().x();
        assert!((x - manager.arena().min_x()).abs() < f64::EPSILON);
        assert!(manager.create_agent(None, f64::NAN).is_err());
    }

    #[test]
    fn removing_active_pet_hands_over() {
        let mut manager = manager();
        let first = manager.create_agent(None, 100.0).unwrap();
        let second = manager.create_agent(None, 200.0).unwrap();
        manager.remove_agent(first).unwrap();
        assert_eq!(manager.active_agent(), Some(second));
        manager.remove_agent(second).unwrap();
        assert_eq!(manager.active_agent(), None);
        assert_eq!(
            manager.remove_agent(second),
            Err(CommandError::PetNotFound { agent: second })
        );
    }

    #[test]
    fn removing_pursuer_releases_claim() {
        let mut manager = manager();
        let pet = manager.create_agent(None, 100.0).unwrap();
        manager
            .pet_mut(pet)
            .unwrap()
            .needs_mut()
            .set(NeedKind::Hunger, 10.0);
        let item = manager.purchase_and_drop(ResourceKind::Food, 500.0).unwrap();
        assert_eq!(manager.pool().arbiter().holder_of(item), Some(pet));
        manager.remove_agent(pet).unwrap();
        assert!(manager.pool().arbiter().is_empty());
        assert!(manager.pool().get(item).is_some());
    }

    #[test]
    fn purchase_spends_then_drops() {
        let mut manager = manager();
        let item = manager.purchase_and_drop(ResourceKind::Food, 300.0).unwrap();
        assert_eq!(manager.balance(), Decimal::from(95_u32));
        assert_eq!(manager.inventory().count(Supply::Food), 0);
        assert!(manager.pool().get(item).is_some());
    }

    #[test]
    fn held_unit_is_dropped_without_spending() {
        let mut manager = manager();
        manager.buy(Supply::Toy).unwrap();
        assert_eq!(manager.balance(), Decimal::from(92_u32));
        manager.use_toy(400.0, 0.0).unwrap();
        assert_eq!(manager.balance(), Decimal::from(92_u32));
        assert_eq!(manager.inventory().count(Supply::Toy), 0);
    }

    #[test]
    fn insufficient_balance_changes_nothing() {
        let mut config = SimulationConfig::default();
        config.economy.starting_balance = Decimal::from(3_u32);
        let mut manager = PetManager::with_local_ledger(config);
        let result = manager.purchase_and_drop(ResourceKind::Food, 300.0);
        assert!(matches!(result, Err(CommandError::InsufficientBalance { .. })));
        assert_eq!(manager.balance(), Decimal::from(3_u32));
        assert!(manager.pool().is_empty());
        assert!(manager.drain_notifications().iter().any(|n| matches!(
            n,
            Notification::InsufficientBalance { supply: Supply::Food, .. }
        )));
    }

    #[test]
    fn full_inventory_refuses_before_spending() {
        let mut config = SimulationConfig::default();
        config.economy.caps.toy = 1;
        let mut manager = PetManager::with_local_ledger(config);
        manager.buy(Supply::Toy).unwrap();
        let before = manager.balance();
        assert_eq!(
            manager.buy(Supply::Toy),
            Err(CommandError::InventoryFull {
                supply: Supply::Toy,
                cap: 1
            })
        );
        assert_eq!(manager.balance(), before);
    }

    #[test]
    fn waste_cannot_be_bought() {
        let mut manager = manager();
        assert_eq!(
            manager.purchase_and_drop(ResourceKind::Waste, 100.0),
            Err(CommandError::NotDroppable {
                kind: ResourceKind::Waste
            })
        );
    }

    #[test]
    fn cleanup_without_waste_uses_nothing() {
        let mut manager = manager();
        assert_eq!(manager.use_cleanup_tool(300.0, 0.0), Ok(None));
        assert_eq!(manager.balance(), Decimal::from(100_u32));
        assert!(manager.drain_notifications().contains(&Notification::NothingToClean { x: 300.0 }));
    }

    #[test]
    fn cleanup_restores_the_pet_that_left_the_waste() {
        let mut manager = manager();
        let owner = manager.create_agent(None, 300.0).unwrap();
        let other = manager.create_agent(None, 600.0).unwrap();
        manager.set_active_agent(other).unwrap();
        manager
            .pet_mut(owner)
            .unwrap()
            .needs_mut()
            .set(NeedKind::Cleanliness, 30.0);
        let waste = manager.spawn_item(ResourceKind::Waste, 310.0, Some(owner));

        assert_eq!(manager.use_cleanup_tool(320.0, 0.0), Ok(Some(waste)));
        assert!(manager.pool().get(waste).is_none());
        assert_eq!(manager.balance(), Decimal::from(90_u32));
        let level = manager.pet(owner).unwrap().needs().cleanliness;
        assert!((level - 50.0).abs() < 1e-9);
    }

    #[test]
    fn directed_activity_ends_pursuit() {
        let mut manager = manager();
        let pet = manager.create_agent(None, 100.0).unwrap();
        manager
            .pet_mut(pet)
            .unwrap()
            .needs_mut()
            .set(NeedKind::Hunger, 10.0);
        manager.purchase_and_drop(ResourceKind::Food, 500.0).unwrap();
        manager.direct_activity(None, Activity::Sleeping).unwrap();
        let state = manager.pet(pet).unwrap();
        assert_eq!(state.activity(), Activity::Sleeping);
        assert!(state.is_externally_directed());
        assert!(!state.is_pursuing());
        assert!(manager.pool().arbiter().is_empty());
    }

    #[test]
    fn direct_activity_needs_a_pet() {
        let mut manager = manager();
        assert_eq!(
            manager.direct_activity(None, Activity::Playing),
            Err(CommandError::NoActivePet)
        );
    }

    #[test]
    fn force_reset_clears_everything() {
        let mut manager = manager();
        let pet = manager.create_agent(None, 100.0).unwrap();
        manager
            .pet_mut(pet)
            .unwrap()
            .needs_mut()
            .set(NeedKind::Hunger, 10.0);
        manager.purchase_and_drop(ResourceKind::Food, 500.0).unwrap();
        assert_eq!(manager.execute(Command::ForceResetAll), Ok(CommandOutcome::Reset { agents: 1 }));
        let state = manager.pet(pet).unwrap();
        assert!(!state.is_pursuing());
        assert!(!state.is_externally_directed());
        assert!(manager.pool().arbiter().is_empty());
        assert!(manager.timers().any(|event| *event == TimerEvent::SettleCheck { agent: pet }));
    }

    #[test]
    fn stats_report_bands_and_wallet() {
        let mut manager = manager();
        let pet = manager.create_agent(None, 100.0).unwrap();
        manager
            .pet_mut(pet)
            .unwrap()
            .needs_mut()
            .set(NeedKind::Hunger, 20.0);
        let stats = manager.get_stats();
        assert_eq!(stats.active, Some(pet));
        assert_eq!(stats.balance, Decimal::from(100_u32));
        let entry = stats.pets.first().unwrap();
        assert_eq!(entry.hunger_band, NeedBand::Starving);
        assert_eq!(entry.happiness_band, NeedBand::Ecstatic);
    }

    #[test]
    fn execute_maps_outcomes() {
        let mut manager = manager();
        let outcome = manager
            .execute(Command::CreateAgent { id: None, x: 250.0 })
            .unwrap();
        let agent = manager.active_agent().unwrap();
        assert_eq!(outcome, CommandOutcome::AgentCreated { agent });
        assert_eq!(
            manager.execute(Command::UseCleanupTool { x: 10.0, y: 0.0 }),
            Ok(CommandOutcome::NothingToClean)
        );
        assert_eq!(
            manager.execute(Command::DirectActivity {
                agent: Some(agent),
                activity: Activity::Walking
            }),
            Ok(CommandOutcome::ActivityDirected { agent })
        );
    }

    #[test]
    fn snapshots_serialise_for_the_host() {
        let mut manager = manager();
        let pet = manager.create_agent(None, 200.0).unwrap();
        manager.purchase_and_drop(ResourceKind::Toy, 500.0).unwrap();

        let stats = serde_json::to_value(manager.get_stats()).unwrap();
        assert_eq!(stats.pointer("/balance"), Some(&serde_json::json!("92")));
        assert_eq!(
            stats.pointer("/pets/0/id"),
            Some(&serde_json::json!(pet.to_string()))
        );

        let items = serde_json::to_value(manager.resource_snapshot()).unwrap();
        assert_eq!(items.as_array().map(Vec::len), Some(1));
        assert_eq!(items.pointer("/0/kind"), Some(&serde_json::json!("Toy")));
    }
}
