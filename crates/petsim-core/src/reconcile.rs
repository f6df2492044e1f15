//! The reconciliation adapter: local optimistic state against a remote
//! authority.
//!
//! Inbound events are applied between ticks as single atomic patches: the
//! whole patch is validated before anything is mutated, so a malformed
//! event leaves local state untouched. Application is create-or-update and
//! idempotent; removal of an unknown entity is a no-op.
//!
//! Outbound, the adapter turns local happenings (drops, consumption,
//! cleanup, pet removal) into [`Intent`]s. Purchases follow the
//! [`AuthorityPolicy`]:
//!
//! - **Local** -- settled immediately against the local wallet; a mirror
//!   intent marked `settled_locally` tells the authority what happened.
//! - **Server** -- sent as a pending request and left unsettled until the
//!   authority upserts the item carrying the request id (or rejects it).
//!   While the transport is down, purchases fall back to local settlement.
//!
//! Balance and inventory counts arriving inbound always overwrite local
//! values. Once one has arrived the authority owns them: under either
//! policy, purchases become pending requests and held units are used
//! without touching the local counters until the next authoritative value.

use std::collections::{BTreeMap, BTreeSet};

use petsim_agents::pet::{check_level, check_position, check_speed};
use petsim_agents::{AgentError, Pet};
use petsim_ledger::LedgerError;
use petsim_types::{
    Activity, AgentId, Command, CommandOutcome, EntityFields, EntityKind, Facing, FieldChange,
    InboundEvent, Intent, ItemId, NeedKind, Notification, RemovalCause, RequestId, ResourceKind,
    Supply,
};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AuthorityPolicy;
use crate::manager::{CommandError, PetManager, TickError, TickReport};

/// Errors raised while applying inbound events or routing commands.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReconcileError {
    /// A field carried a value local state cannot hold.
    #[error("entity {entity}: {source}")]
    InvalidField {
        /// The entity the event refers to.
        entity: Uuid,
        /// What was wrong with the value.
        #[source]
        source: AgentError,
    },

    /// Creating an entity needs a field the event did not carry.
    #[error("entity {entity}: missing field {field}")]
    MissingField {
        /// The entity the event refers to.
        entity: Uuid,
        /// The missing field.
        field: &'static str,
    },

    /// The authority reported a negative balance.
    #[error("negative balance {balance}")]
    NegativeBalance {
        /// The rejected value.
        balance: Decimal,
    },

    /// The wallet refused an overwrite.
    #[error("ledger error: {source}")]
    Ledger {
        /// The underlying ledger error.
        #[from]
        source: LedgerError,
    },

    /// A command routed through the adapter failed.
    #[error("command error: {source}")]
    Command {
        /// The underlying command error.
        #[from]
        source: CommandError,
    },
}

/// What applying an inbound event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// A new local entity was created.
    Created,
    /// An existing entity was patched.
    Updated,
    /// An entity was removed.
    Removed,
    /// The event referred to nothing local; no change.
    Ignored,
    /// A pending request was rejected by the authority.
    Rejected,
}

/// A purchase waiting for the authority's answer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingPurchase {
    /// What was requested.
    pub supply: Supply,
    /// Price at the time of the request.
    pub price: Decimal,
    /// Where the item should be dropped, if it is dropped immediately.
    pub drop_x: Option<f64>,
}

/// A pet patch whose every field has passed validation.
#[derive(Debug, Clone, Default)]
struct PetPatch {
    x: Option<f64>,
    speed: Option<f64>,
    facing: Option<Facing>,
    activity: Option<Activity>,
    levels: Vec<(NeedKind, f64)>,
    pursuing: Option<bool>,
    target: Option<ItemId>,
}

impl PetPatch {
    fn validate(entity: Uuid, fields: &EntityFields) -> Result<Self, ReconcileError> {
        let invalid = |source: AgentError| ReconcileError::InvalidField { entity, source };
        let mut levels = Vec::new();
        for (kind, level) in [
            (NeedKind::Hunger, fields.hunger),
            (NeedKind::Cleanliness, fields.cleanliness),
            (NeedKind::Happiness, fields.happiness),
        ] {
            if let Some(level) = level {
                levels.push((kind, check_level(kind, level).map_err(invalid)?));
            }
        }
        Ok(Self {
            x: fields.x.map(check_position).transpose().map_err(invalid)?,
            speed: fields.speed.map(check_speed).transpose().map_err(invalid)?,
            facing: fields.facing,
            activity: fields.activity,
            levels,
            pursuing: fields.pursuing,
            target: fields.target_item,
        })
    }
}

/// Bridges a [`PetManager`] to a remote authority.
#[derive(Debug)]
pub struct ReconciliationAdapter {
    policy: AuthorityPolicy,
    manager: PetManager,
    pending: BTreeMap<RequestId, PendingPurchase>,
    outbound: Vec<Intent>,
    notifications: Vec<Notification>,
    transport_available: bool,
    remote_active: bool,
    remote_items: BTreeSet<ItemId>,
    remote_removals: BTreeSet<AgentId>,
}

impl ReconciliationAdapter {
    /// Wrap a manager under the policy from its configuration.
    pub fn new(manager: PetManager) -> Self {
        let policy = manager.config().reconciliation.policy;
        Self::with_policy(manager, policy)
    }

    /// Wrap a manager under an explicit policy.
    pub const fn with_policy(manager: PetManager, policy: AuthorityPolicy) -> Self {
        Self {
            policy,
            manager,
            pending: BTreeMap::new(),
            outbound: Vec::new(),
            notifications: Vec::new(),
            transport_available: true,
            remote_active: false,
            remote_items: BTreeSet::new(),
            remote_removals: BTreeSet::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The wrapped manager.
    pub const fn manager(&self) -> &PetManager {
        &self.manager
    }

    /// The wrapped manager, mutably. Changes made here are picked up on
    /// the next call that collects outbound intents.
    pub const fn manager_mut(&mut self) -> &mut PetManager {
        &mut self.manager
    }

    /// The policy in effect.
    pub const fn policy(&self) -> AuthorityPolicy {
        self.policy
    }

    /// Whether any authoritative wallet value has been received.
    pub const fn remote_active(&self) -> bool {
        self.remote_active
    }

    /// Purchases awaiting the authority's answer.
    pub const fn pending(&self) -> &BTreeMap<RequestId, PendingPurchase> {
        &self.pending
    }

    /// Flag the transport as up or down. Under the server policy a down
    /// transport means purchases settle locally.
    pub fn set_transport_available(&mut self, available: bool) {
        if self.transport_available != available {
            info!(available, policy = ?self.policy, "transport availability changed");
        }
        self.transport_available = available;
    }

    /// Take every intent produced since the last drain.
    pub fn drain_intents(&mut self) -> Vec<Intent> {
        self.collect();
        std::mem::take(&mut self.outbound)
    }

    /// Take every notification produced since the last drain.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.collect();
        std::mem::take(&mut self.notifications)
    }

    fn defers_purchases(&self) -> bool {
        self.transport_available && (self.policy == AuthorityPolicy::Server || self.remote_active)
    }

    /// Whether balance and inventory are authority-owned right now.
    const fn authority_owns_wallet(&self) -> bool {
        self.remote_active && self.transport_available
    }

    // -----------------------------------------------------------------------
    // Local driving
    // -----------------------------------------------------------------------

    /// Advance the wrapped simulation one tick.
    pub fn tick(&mut self, delta_ms: u64) -> Result<TickReport, TickError> {
        let report = self.manager.tick(delta_ms);
        self.collect();
        report
    }

    /// Run a command, routing purchases through the policy.
    pub fn execute(&mut self, command: Command) -> Result<CommandOutcome, ReconcileError> {
        let result = match command {
            Command::PurchaseAndDrop { kind, x } => self.purchase_and_drop(kind, x),
            Command::UseToy { x, .. } => self.purchase_and_drop(ResourceKind::Toy, x),
            Command::UseCleanupTool { x, y } => self.use_cleanup_tool(x, y),
            other => self.manager.execute(other).map_err(ReconcileError::from),
        };
        self.collect();
        result
    }

    /// Drop food or a toy at `x`. Under a deferring policy an item not held
    /// in inventory becomes a pending purchase instead, and a held unit is
    /// dropped without local accounting once the authority owns the wallet.
    pub fn purchase_and_drop(
        &mut self,
        kind: ResourceKind,
        x: f64,
    ) -> Result<CommandOutcome, ReconcileError> {
        let supply = kind
            .supply()
            .ok_or(CommandError::NotDroppable { kind })?;
        let held = self.manager.inventory().has(supply);
        if self.defers_purchases() && !held {
            let x = check_position(x).map_err(CommandError::from)?;
            return self.request_purchase(supply, Some(x));
        }
        if self.authority_owns_wallet() {
            let item = self.manager.drop_unaccounted(kind, x)?;
            debug!(item = %item, supply = ?supply, "held unit dropped, authority accounts for it");
            return Ok(CommandOutcome::Dropped { item });
        }
        let item = self.manager.purchase_and_drop(kind, x)?;
        if !held {
            self.mirror_purchase(supply, Some(x));
        }
        Ok(CommandOutcome::Dropped { item })
    }

    /// Use the cleanup tool. Under a deferring policy with no tool held,
    /// the tool is requested from the authority first.
    pub fn use_cleanup_tool(&mut self, x: f64, y: f64) -> Result<CommandOutcome, ReconcileError> {
        let held = self.manager.inventory().has(Supply::CleaningTool);
        let radius = self.manager.config().resources.interaction_radius;
        let in_reach = self
            .manager
            .pool()
            .find_nearest_within(ResourceKind::Waste, x, radius)
            .is_some();
        if self.defers_purchases() && !held && in_reach {
            return self.request_purchase(Supply::CleaningTool, None);
        }
        let cleaned = if self.authority_owns_wallet() && held {
            self.manager.clean_unaccounted(x)?
        } else {
            self.manager.use_cleanup_tool(x, y)?
        };
        let Some(item) = cleaned else {
            return Ok(CommandOutcome::NothingToClean);
        };
        if !held {
            self.mirror_purchase(Supply::CleaningTool, None);
        }
        Ok(CommandOutcome::Cleaned { item })
    }

    fn request_purchase(
        &mut self,
        supply: Supply,
        drop_x: Option<f64>,
    ) -> Result<CommandOutcome, ReconcileError> {
        let price = self.manager.config().economy.prices.price(supply);
        let balance = self.manager.balance();
        if balance < price {
            self.manager.notify(Notification::InsufficientBalance {
                supply,
                price,
                balance,
            });
            return Err(CommandError::InsufficientBalance {
                supply,
                price,
                balance,
            }
            .into());
        }
        let request = RequestId::new();
        self.pending.insert(
            request,
            PendingPurchase {
                supply,
                price,
                drop_x,
            },
        );
        self.outbound.push(Intent::Purchase {
            request,
            supply,
            price,
            drop_x,
            settled_locally: false,
        });
        info!(request = %request, supply = ?supply, price = %price, "purchase requested from authority");
        Ok(CommandOutcome::PurchasePending { request })
    }

    fn mirror_purchase(&mut self, supply: Supply, drop_x: Option<f64>) {
        let price = self.manager.config().economy.prices.price(supply);
        self.outbound.push(Intent::Purchase {
            request: RequestId::new(),
            supply,
            price,
            drop_x,
            settled_locally: true,
        });
    }

    // -----------------------------------------------------------------------
    // Inbound
    // -----------------------------------------------------------------------

    /// Apply one inbound event as an atomic patch.
    ///
    /// # Errors
    ///
    /// Returns an error, with no local change, if any carried field is
    /// invalid or a field needed to create the entity is missing.
    pub fn apply(&mut self, event: InboundEvent) -> Result<ApplyOutcome, ReconcileError> {
        let result = match event {
            InboundEvent::EntityUpserted { kind, id, fields } => self.upsert(kind, id, &fields),
            InboundEvent::EntityRemoved { kind, id } => Ok(self.remove(kind, id)),
            InboundEvent::FieldChanged { entity_id, change } => {
                self.change_field(entity_id, change)
            }
            InboundEvent::IntentRejected { request, reason } => {
                let Some(pending) = self.pending.remove(&request) else {
                    debug!(request = %request, "rejection for unknown request ignored");
                    return Ok(ApplyOutcome::Ignored);
                };
                warn!(request = %request, supply = ?pending.supply, reason = ?reason, "purchase rejected by authority");
                self.manager
                    .notify(Notification::PurchaseRejected { request, reason });
                Ok(ApplyOutcome::Rejected)
            }
        };
        self.collect();
        result
    }

    fn upsert(
        &mut self,
        kind: EntityKind,
        id: Uuid,
        fields: &EntityFields,
    ) -> Result<ApplyOutcome, ReconcileError> {
        match kind {
            EntityKind::Pet => self.upsert_pet(AgentId(id), fields),
            EntityKind::Item { kind } => self.upsert_item(kind, ItemId(id), fields),
            EntityKind::Wallet => self.apply_wallet(fields),
        }
    }

    fn upsert_pet(
        &mut self,
        id: AgentId,
        fields: &EntityFields,
    ) -> Result<ApplyOutcome, ReconcileError> {
        let patch = PetPatch::validate(id.into_inner(), fields)?;
        if self.manager.has_pet(id) {
            self.patch_pet(id, &patch)?;
            return Ok(ApplyOutcome::Updated);
        }
        let x = patch.x.unwrap_or_else(|| self.manager.arena().centre());
        self.manager.create_agent(Some(id), x)?;
        self.patch_pet(id, &patch)?;
        info!(agent = %id, x, "pet created from authority");
        Ok(ApplyOutcome::Created)
    }

    fn patch_pet(&mut self, id: AgentId, patch: &PetPatch) -> Result<(), ReconcileError> {
        if let Some(x) = patch.x {
            self.manager.sync_position(id, x);
        }
        if let Some(pet) = self.manager.pet_mut(id) {
            if let Some(speed) = patch.speed {
                pet.set_speed(speed);
            }
            if let Some(facing) = patch.facing {
                pet.set_facing(facing);
            }
            for (kind, level) in &patch.levels {
                pet.needs_mut().set(*kind, *level);
            }
        }
        if let Some(activity) = patch.activity {
            let current = self.manager.pet(id).map(Pet::activity);
            if current != Some(activity) {
                self.manager.direct_activity(Some(id), activity)?;
            }
        }
        match (patch.pursuing, patch.target) {
            (Some(false), _) => {
                self.manager.end_pursuit_of(id);
            }
            (Some(true) | None, Some(item)) => {
                if !self.manager.direct_pursuit(id, item) {
                    self.flag_unmapped_chase(id, Some(item));
                }
            }
            (Some(true), None) => self.flag_unmapped_chase(id, None),
            (None, None) => {}
        }
        Ok(())
    }

    /// The authority reports a chase with no local claim behind it. The
    /// raw flag is recorded; the watchdog clears it if nothing backs it.
    fn flag_unmapped_chase(&mut self, id: AgentId, item: Option<ItemId>) {
        let Some(pet) = self.manager.pet_mut(id) else {
            return;
        };
        if pet.is_pursuing() {
            return;
        }
        debug!(agent = %id, item = ?item, "remote chase without a local claim");
        pet.set_chasing_flag(true);
    }

    fn upsert_item(
        &mut self,
        kind: ResourceKind,
        id: ItemId,
        fields: &EntityFields,
    ) -> Result<ApplyOutcome, ReconcileError> {
        let entity = id.into_inner();
        let x = fields
            .x
            .map(check_position)
            .transpose()
            .map_err(|source| ReconcileError::InvalidField { entity, source })?;
        let live = self.manager.pool().get(id).is_some();
        if !live && x.is_none() {
            return Err(ReconcileError::MissingField { entity, field: "x" });
        }

        if let Some(request) = fields.request_id {
            if let Some(pending) = self.pending.remove(&request) {
                info!(request = %request, item = %id, supply = ?pending.supply, "purchase confirmed by authority");
            }
        }

        match x {
            Some(x) if !live => {
                let ttl = fields
                    .ttl_ms
                    .unwrap_or(self.manager.config().resources.remote_item_ttl_ms);
                self.remote_items.insert(id);
                self.manager.insert_remote_item(id, kind, x, ttl);
                Ok(ApplyOutcome::Created)
            }
            Some(x) => {
                self.manager.move_item(id, x);
                Ok(ApplyOutcome::Updated)
            }
            None => Ok(ApplyOutcome::Updated),
        }
    }

    fn apply_wallet(&mut self, fields: &EntityFields) -> Result<ApplyOutcome, ReconcileError> {
        if let Some(balance) = fields.balance {
            if balance < Decimal::ZERO {
                return Err(ReconcileError::NegativeBalance { balance });
            }
        }
        if let Some(request) = fields.request_id {
            if let Some(pending) = self.pending.remove(&request) {
                info!(request = %request, supply = ?pending.supply, "purchase confirmed by authority");
            }
        }
        if fields.balance.is_none() && fields.inventory.is_none() {
            return Ok(ApplyOutcome::Ignored);
        }
        if let Some(balance) = fields.balance {
            self.manager.overwrite_balance(balance)?;
        }
        if let Some(inventory) = &fields.inventory {
            for (supply, count) in inventory {
                self.manager.overwrite_inventory(*supply, *count);
            }
        }
        if !self.remote_active {
            info!("authoritative wallet values received");
        }
        self.remote_active = true;
        Ok(ApplyOutcome::Updated)
    }

    fn remove(&mut self, kind: EntityKind, id: Uuid) -> ApplyOutcome {
        match kind {
            EntityKind::Pet => {
                let agent = AgentId(id);
                if !self.manager.has_pet(agent) {
                    return ApplyOutcome::Ignored;
                }
                self.remote_removals.insert(agent);
                match self.manager.remove_agent(agent) {
                    Ok(()) => ApplyOutcome::Removed,
                    Err(_) => ApplyOutcome::Ignored,
                }
            }
            EntityKind::Item { .. } => {
                match self.manager.destroy_item(ItemId(id), RemovalCause::Remote) {
                    Some(_) => ApplyOutcome::Removed,
                    None => ApplyOutcome::Ignored,
                }
            }
            EntityKind::Wallet => ApplyOutcome::Ignored,
        }
    }

    fn change_field(
        &mut self,
        entity: Uuid,
        change: FieldChange,
    ) -> Result<ApplyOutcome, ReconcileError> {
        let wallet = matches!(
            change,
            FieldChange::Balance { .. } | FieldChange::Inventory { .. }
        );
        let fields = change.into_fields();
        if wallet {
            return self.apply_wallet(&fields);
        }
        if self.manager.has_pet(AgentId(entity)) {
            return self.upsert_pet(AgentId(entity), &fields);
        }
        let item = ItemId(entity);
        if let Some(kind) = self.manager.pool().get(item).map(|found| found.kind) {
            return self.upsert_item(kind, item, &fields);
        }
        debug!(entity = %entity, "field change for unknown entity ignored");
        Ok(ApplyOutcome::Ignored)
    }

    // -----------------------------------------------------------------------
    // Outbound
    // -----------------------------------------------------------------------

    /// Move the manager's notifications into the adapter, deriving the
    /// outbound intents they imply.
    fn collect(&mut self) {
        for notification in self.manager.drain_notifications() {
            match notification {
                Notification::ResourceAppeared { item, kind, x } => {
                    if !self.remote_items.remove(&item) {
                        self.outbound.push(Intent::ItemDropped { item, kind, x });
                    }
                }
                Notification::Consumed { agent, item, .. } => {
                    self.outbound.push(Intent::ItemConsumed { agent, item });
                }
                Notification::ResourceRemoved {
                    item,
                    cause: RemovalCause::CleanedUp,
                    ..
                } => {
                    self.outbound.push(Intent::ItemCleaned { item });
                }
                Notification::AgentRemoved { agent } => {
                    if !self.remote_removals.remove(&agent) {
                        self.outbound.push(Intent::PetRemoved { agent });
                    }
                }
                _ => {}
            }
            self.notifications.push(notification);
        }
    }
}
