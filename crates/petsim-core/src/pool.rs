//! The resource pool: live items per kind, their lifetimes, and claims.
//!
//! Items are kept per kind in creation order, which is what makes the
//! nearest-unclaimed lookup deterministic: of two equally distant items the
//! earlier one wins. Removing an item always releases its claim before the
//! item leaves the pool.
//!
//! The pool implements [`ResourceHost`], the only view need systems get.

use std::collections::BTreeMap;

use petsim_agents::{ConsumedItem, ResourceHost};
use petsim_types::{AgentId, ItemId, RemovalCause, ResourceKind, ResourceSnapshot};
use tracing::{debug, warn};

use crate::arbiter::{ClaimError, ContentionArbiter};

/// A live droppable item.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceItem {
    /// Identifier (local or authority-assigned).
    pub id: ItemId,
    /// Food, waste, or toy.
    pub kind: ResourceKind,
    /// Horizontal position.
    pub x: f64,
    /// Simulation time of creation.
    pub created_at_ms: u64,
    /// Simulation time of expiry, if the item has a lifetime.
    pub expires_at_ms: Option<u64>,
    /// The pet that produced the item (waste), if any.
    pub source: Option<AgentId>,
}

/// An item that left the pool.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedItem {
    /// The item as it was.
    pub item: ResourceItem,
    /// The claim that was released by the removal.
    pub released: Option<AgentId>,
    /// Why it left.
    pub cause: RemovalCause,
}

/// Live items and the claim table.
#[derive(Debug, Clone, Default)]
pub struct ResourcePool {
    items: BTreeMap<ResourceKind, Vec<ResourceItem>>,
    arbiter: ContentionArbiter,
}

impl ResourcePool {
    /// An empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an item at `x`. With a `ttl_ms`, the item records its expiry;
    /// the orchestrator schedules the matching timer.
    pub fn spawn(
        &mut self,
        kind: ResourceKind,
        x: f64,
        now_ms: u64,
        ttl_ms: Option<u64>,
        source: Option<AgentId>,
    ) -> ItemId {
        let id = ItemId::new();
        self.push(ResourceItem {
            id,
            kind,
            x,
            created_at_ms: now_ms,
            expires_at_ms: ttl_ms.map(|ttl| now_ms.saturating_add(ttl)),
            source,
        });
        id
    }

    /// Insert an item with a known id. Returns `false` if the id is taken.
    pub fn insert(&mut self, item: ResourceItem) -> bool {
        if self.get(item.id).is_some() {
            return false;
        }
        self.push(item);
        true
    }

    fn push(&mut self, item: ResourceItem) {
        debug!(item = %item.id, kind = ?item.kind, x = item.x, "item spawned");
        self.items.entry(item.kind).or_default().push(item);
    }

    /// Look up a live item.
    pub fn get(&self, id: ItemId) -> Option<&ResourceItem> {
        self.items.values().flatten().find(|item| item.id == id)
    }

    /// Move a live item. Returns whether it exists.
    pub fn move_item(&mut self, id: ItemId, x: f64) -> bool {
        let found = self
            .items
            .values_mut()
            .flatten()
            .find(|item| item.id == id);
        match found {
            Some(item) => {
                item.x = x;
                true
            }
            None => false,
        }
    }

    /// Claim a live item for `agent`.
    pub fn try_claim(&mut self, item: ItemId, agent: AgentId) -> Result<(), ClaimError> {
        if self.get(item).is_none() {
            return Err(ClaimError::UnknownItem { item });
        }
        self.arbiter.claim(item, agent)
    }

    /// Drop whatever claim `agent` holds.
    pub fn release_agent(&mut self, agent: AgentId) -> Option<ItemId> {
        self.arbiter.release_agent(agent)
    }

    /// Drop the claim on `item`, whoever holds it.
    pub fn release_item(&mut self, item: ItemId) -> Option<AgentId> {
        self.arbiter.release_item(item)
    }

    /// Drop every claim.
    pub fn clear_claims(&mut self) -> Vec<(ItemId, AgentId)> {
        self.arbiter.clear()
    }

    /// Remove an item, releasing its claim first.
    pub fn remove(&mut self, id: ItemId, cause: RemovalCause) -> Option<RemovedItem> {
        let (kind, index) = self.items.iter().find_map(|(kind, items)| {
            items
                .iter()
                .position(|item| item.id == id)
                .map(|index| (*kind, index))
        })?;
        let released = self.arbiter.release_item(id);
        let items = self.items.get_mut(&kind)?;
        if index >= items.len() {
            return None;
        }
        let item = items.remove(index);
        debug!(item = %id, kind = ?kind, cause = ?cause, "item removed");
        Some(RemovedItem {
            item,
            released,
            cause,
        })
    }

    /// The unclaimed item of `kind` nearest to `from_x`; ties go to the
    /// earliest-created item.
    pub fn find_nearest_unclaimed(&self, kind: ResourceKind, from_x: f64) -> Option<&ResourceItem> {
        self.nearest(kind, from_x, |item| !self.arbiter.is_claimed(item.id))
    }

    /// The item of `kind` nearest to `x` within `radius`, claimed or not.
    pub fn find_nearest_within(
        &self,
        kind: ResourceKind,
        x: f64,
        radius: f64,
    ) -> Option<&ResourceItem> {
        self.nearest(kind, x, |item| (item.x - x).abs() <= radius)
    }

    fn nearest<F>(&self, kind: ResourceKind, from_x: f64, accept: F) -> Option<&ResourceItem>
    where
        F: Fn(&ResourceItem) -> bool,
    {
        let mut best: Option<(&ResourceItem, f64)> = None;
        for item in self.items.get(&kind).into_iter().flatten() {
            if !accept(item) {
                continue;
            }
            let distance = (item.x - from_x).abs();
            // Strict comparison keeps the earliest item on ties.
            if best.is_none_or(|(_, best_distance)| distance < best_distance) {
                best = Some((item, distance));
            }
        }
        best.map(|(item, _)| item)
    }

    /// Live items of one kind, oldest first.
    pub fn items_of(&self, kind: ResourceKind) -> &[ResourceItem] {
        self.items.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Number of live items.
    pub fn len(&self) -> usize {
        self.items.values().map(Vec::len).sum()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.items.values().all(Vec::is_empty)
    }

    /// The claim table.
    pub const fn arbiter(&self) -> &ContentionArbiter {
        &self.arbiter
    }

    /// Host-facing view of every live item.
    pub fn snapshot(&self) -> Vec<ResourceSnapshot> {
        self.items
            .values()
            .flatten()
            .map(|item| ResourceSnapshot {
                id: item.id,
                kind: item.kind,
                x: item.x,
                created_at_ms: item.created_at_ms,
                expires_at_ms: item.expires_at_ms,
                claimed_by: self.arbiter.holder_of(item.id),
            })
            .collect()
    }
}

impl ResourceHost for ResourcePool {
    fn nearest_unclaimed(&self, kind: ResourceKind, from_x: f64) -> Option<(ItemId, f64)> {
        self.find_nearest_unclaimed(kind, from_x)
            .map(|item| (item.id, item.x))
    }

    fn claim(&mut self, item: ItemId, agent: AgentId) -> bool {
        match self.try_claim(item, agent) {
            Ok(()) => true,
            Err(ClaimError::AgentBusy { agent, held }) => {
                warn!(agent = %agent, held = %held, requested = %item, "claim refused: agent already holds an item");
                false
            }
            Err(_) => false,
        }
    }

    fn release(&mut self, agent: AgentId) -> Option<ItemId> {
        self.release_agent(agent)
    }

    fn consume(&mut self, item: ItemId) -> Option<ConsumedItem> {
        let removed = self.remove(item, RemovalCause::Consumed)?;
        Some(ConsumedItem {
            item: removed.item.id,
            kind: removed.item.kind,
            x: removed.item.x,
            displaced: removed.released,
        })
    }
}
