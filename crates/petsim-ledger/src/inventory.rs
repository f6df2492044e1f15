//! Supply inventory: how many units of each purchasable supply are held.
//!
//! Counters are `u32` and only move through checked operations, so no
//! sequence of purchases, drops, or authoritative overwrites can take a
//! line below zero or above its cap.

use std::collections::BTreeMap;

use petsim_types::Supply;
use serde::Deserialize;
use tracing::debug;

use crate::LedgerError;

/// Maximum units held per supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct InventoryCaps {
    /// Cap for food.
    #[serde(default = "default_food_cap")]
    pub food: u32,
    /// Cap for cleaning tools.
    #[serde(default = "default_cleaning_tool_cap")]
    pub cleaning_tool: u32,
    /// Cap for toys.
    #[serde(default = "default_toy_cap")]
    pub toy: u32,
}

impl InventoryCaps {
    /// Cap for one supply line.
    pub const fn cap(&self, supply: Supply) -> u32 {
        match supply {
            Supply::Food => self.food,
            Supply::CleaningTool => self.cleaning_tool,
            Supply::Toy => self.toy,
        }
    }
}

impl Default for InventoryCaps {
    fn default() -> Self {
        Self {
            food: default_food_cap(),
            cleaning_tool: default_cleaning_tool_cap(),
            toy: default_toy_cap(),
        }
    }
}

const fn default_food_cap() -> u32 {
    10
}

const fn default_cleaning_tool_cap() -> u32 {
    5
}

const fn default_toy_cap() -> u32 {
    5
}

/// Per-supply counters with caps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    counts: BTreeMap<Supply, u32>,
    caps: InventoryCaps,
}

impl Inventory {
    /// An empty inventory with the given caps.
    pub fn new(caps: InventoryCaps) -> Self {
        let counts = Supply::ALL.iter().map(|supply| (*supply, 0)).collect();
        Self { counts, caps }
    }

    /// Units held of one supply.
    pub fn count(&self, supply: Supply) -> u32 {
        self.counts.get(&supply).copied().unwrap_or(0)
    }

    /// Whether at least one unit is held.
    pub fn has(&self, supply: Supply) -> bool {
        self.count(supply) > 0
    }

    /// Whether the line is at its cap.
    pub fn is_full(&self, supply: Supply) -> bool {
        self.count(supply) >= self.caps.cap(supply)
    }

    /// The configured caps.
    pub const fn caps(&self) -> &InventoryCaps {
        &self.caps
    }

    /// Add one unit. Returns the new count.
    pub fn add(&mut self, supply: Supply) -> Result<u32, LedgerError> {
        let cap = self.caps.cap(supply);
        let current = self.count(supply);
        if current >= cap {
            return Err(LedgerError::InventoryFull { supply, cap });
        }
        let next = current.checked_add(1).ok_or(LedgerError::Overflow)?;
        self.counts.insert(supply, next);
        debug!(supply = ?supply, count = next, "inventory added");
        Ok(next)
    }

    /// Take one unit. Returns the new count.
    pub fn take(&mut self, supply: Supply) -> Result<u32, LedgerError> {
        let next = self
            .count(supply)
            .checked_sub(1)
            .ok_or(LedgerError::InventoryEmpty { supply })?;
        self.counts.insert(supply, next);
        debug!(supply = ?supply, count = next, "inventory taken");
        Ok(next)
    }

    /// Overwrite one line with an authoritative count (not capped: the
    /// authority owns the number).
    pub fn set(&mut self, supply: Supply, count: u32) {
        self.counts.insert(supply, count);
    }

    /// Snapshot of all lines.
    pub fn counts(&self) -> BTreeMap<Supply, u32> {
        self.counts.clone()
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new(InventoryCaps::default())
    }
}
