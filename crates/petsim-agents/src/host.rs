//! The capability a need system needs from the resource pool.
//!
//! Need systems never see the pool itself. They are handed a
//! `&mut dyn ResourceHost` and may only look up, claim, release, and
//! consume items through it, so claim state has a single writer.

use petsim_types::{AgentId, ItemId, ResourceKind};

/// An item removed from the pool by consumption.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsumedItem {
    /// The removed item.
    pub item: ItemId,
    /// Its kind.
    pub kind: ResourceKind,
    /// Where it was.
    pub x: f64,
    /// A different pet whose claim was dropped by the removal.
    pub displaced: Option<AgentId>,
}

/// Pool operations available to need systems.
pub trait ResourceHost {
    /// The unclaimed item of `kind` nearest to `from_x`, with its position.
    /// Equal distances go to the earliest-created item.
    fn nearest_unclaimed(&self, kind: ResourceKind, from_x: f64) -> Option<(ItemId, f64)>;

    /// Atomically claim `item` for `agent`. Fails if the item is already
    /// claimed by anyone.
    fn claim(&mut self, item: ItemId, agent: AgentId) -> bool;

    /// Drop whatever claim `agent` holds. Returns the released item.
    fn release(&mut self, agent: AgentId) -> Option<ItemId>;

    /// Remove `item`, releasing its claim first.
    fn consume(&mut self, item: ItemId) -> Option<ConsumedItem>;
}
