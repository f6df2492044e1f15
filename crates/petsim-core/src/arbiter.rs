//! The contention arbiter: who may act on which item.
//!
//! A bidirectional map `item <-> agent` is the single source of truth for
//! claims. Every claim mutation goes through [`ContentionArbiter::claim`]
//! or one of the release methods; pets never hold claim state themselves.
//!
//! # Invariants
//!
//! - An item has at most one claimant.
//! - An agent holds at most one claim.
//! - Both directions of the map always agree.

use std::collections::BTreeMap;

use petsim_types::{AgentId, ItemId};
use tracing::debug;

/// Why a claim was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ClaimError {
    /// The item does not exist.
    #[error("item {item} does not exist")]
    UnknownItem {
        /// The requested item.
        item: ItemId,
    },

    /// The item is already claimed.
    #[error("item {item} already claimed by {holder}")]
    AlreadyClaimed {
        /// The requested item.
        item: ItemId,
        /// The current claimant.
        holder: AgentId,
    },

    /// The agent already holds a different item.
    #[error("agent {agent} already holds {held}")]
    AgentBusy {
        /// The requesting agent.
        agent: AgentId,
        /// The item it already holds.
        held: ItemId,
    },
}

/// Bidirectional claim table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentionArbiter {
    by_item: BTreeMap<ItemId, AgentId>,
    by_agent: BTreeMap<AgentId, ItemId>,
}

impl ContentionArbiter {
    /// An empty claim table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claim `item` for `agent`. Fails whenever the item is
    /// already claimed, including by `agent` itself.
    pub fn claim(&mut self, item: ItemId, agent: AgentId) -> Result<(), ClaimError> {
        if let Some(holder) = self.by_item.get(&item).copied() {
            return Err(ClaimError::AlreadyClaimed { item, holder });
        }
        if let Some(held) = self.by_agent.get(&agent).copied() {
            return Err(ClaimError::AgentBusy { agent, held });
        }
        self.by_item.insert(item, agent);
        self.by_agent.insert(agent, item);
        debug!(item = %item, agent = %agent, "claim granted");
        Ok(())
    }

    /// Drop whatever claim `agent` holds. No-op if none.
    pub fn release_agent(&mut self, agent: AgentId) -> Option<ItemId> {
        let item = self.by_agent.remove(&agent)?;
        self.by_item.remove(&item);
        debug!(item = %item, agent = %agent, "claim released");
        Some(item)
    }

    /// Drop whatever claim is held on `item`. No-op if none.
    pub fn release_item(&mut self, item: ItemId) -> Option<AgentId> {
        let agent = self.by_item.remove(&item)?;
        self.by_agent.remove(&agent);
        debug!(item = %item, agent = %agent, "claim released");
        Some(agent)
    }

    /// The agent holding `item`.
    pub fn holder_of(&self, item: ItemId) -> Option<AgentId> {
        self.by_item.get(&item).copied()
    }

    /// The item held by `agent`.
    pub fn claim_of(&self, agent: AgentId) -> Option<ItemId> {
        self.by_agent.get(&agent).copied()
    }

    /// Whether `item` is claimed.
    pub fn is_claimed(&self, item: ItemId) -> bool {
        self.by_item.contains_key(&item)
    }

    /// All claims as `(item, agent)` pairs.
    pub fn claims(&self) -> Vec<(ItemId, AgentId)> {
        self.by_item.iter().map(|(item, agent)| (*item, *agent)).collect()
    }

    /// Number of live claims.
    pub fn len(&self) -> usize {
        self.by_item.len()
    }

    /// Whether no claims are held.
    pub fn is_empty(&self) -> bool {
        self.by_item.is_empty()
    }

    /// Drop every claim. Returns what was held.
    pub fn clear(&mut self) -> Vec<(ItemId, AgentId)> {
        let held = self.claims();
        self.by_item.clear();
        self.by_agent.clear();
        held
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_claimant_is_refused() {
        let mut arbiter = ContentionArbiter::new();
        let item = ItemId::new();
        let a = AgentId::new();
        let b = AgentId::new();
        assert_eq!(arbiter.claim(item, a), Ok(()));
        assert_eq!(
            arbiter.claim(item, b),
            Err(ClaimError::AlreadyClaimed { item, holder: a })
        );
        assert_eq!(arbiter.holder_of(item), Some(a));
        assert_eq!(arbiter.claim_of(b), None);
    }

    #[test]
    fn reclaim_by_holder_is_refused() {
        let mut arbiter = ContentionArbiter::new();
        let item = ItemId::new();
        let agent = AgentId::new();
        assert_eq!(arbiter.claim(item, agent), Ok(()));
        assert_eq!(
            arbiter.claim(item, agent),
            Err(ClaimError::AlreadyClaimed {
                item,
                holder: agent
            })
        );
        assert_eq!(arbiter.holder_of(item), Some(agent));
        assert_eq!(arbiter.len(), 1);
    }

    #[test]
    fn one_claim_per_agent() {
        let mut arbiter = ContentionArbiter::new();
        let first = ItemId::new();
        let second = ItemId::new();
        let agent = AgentId::new();
        arbiter.claim(first, agent).ok();
        assert_eq!(
            arbiter.claim(second, agent),
            Err(ClaimError::AgentBusy { agent, held: first })
        );
    }

    #[test]
    fn release_is_idempotent_and_symmetric() {
        let mut arbiter = ContentionArbiter::new();
        let item = ItemId::new();
        let agent = AgentId::new();
        arbiter.claim(item, agent).ok();
        assert_eq!(arbiter.release_agent(agent), Some(item));
        assert_eq!(arbiter.release_agent(agent), None);
        assert!(!arbiter.is_claimed(item));

        arbiter.claim(item, agent).ok();
        assert_eq!(arbiter.release_item(item), Some(agent));
        assert_eq!(arbiter.claim_of(agent), None);
        assert!(arbiter.is_empty());
    }

    #[test]
    fn clear_reports_held_claims() {
        let mut arbiter = ContentionArbiter::new();
        let item = ItemId::new();
        let agent = AgentId::new();
        arbiter.claim(item, agent).ok();
        assert_eq!(arbiter.clear(), vec![(item, agent)]);
        assert!(arbiter.is_empty());
    }
}
