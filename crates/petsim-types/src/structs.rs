//! Core value structs shared between the simulation and its host.
//!
//! Covers the three need levels of a pet and the read-only snapshots
//! handed to the renderer for draw calls and to the UI for stats.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Activity, Facing, NeedBand, NeedKind, ResourceKind, Supply};
use crate::ids::{AgentId, ItemId};

/// Upper bound of every need level.
pub const MAX_NEED: f64 = 100.0;

/// Lower bound of every need level.
pub const MIN_NEED: f64 = 0.0;

// ---------------------------------------------------------------------------
// Need levels
// ---------------------------------------------------------------------------

/// The three need levels of a pet, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NeedLevels {
    /// Satiation (100 = full).
    pub hunger: f64,
    /// Cleanliness (100 = spotless).
    pub cleanliness: f64,
    /// Happiness (100 = ecstatic).
    pub happiness: f64,
}

impl NeedLevels {
    /// All needs fully satisfied. The level every new pet starts with.
    pub const fn full() -> Self {
        Self {
            hunger: MAX_NEED,
            cleanliness: MAX_NEED,
            happiness: MAX_NEED,
        }
    }

    /// Read one axis.
    pub const fn get(&self, kind: NeedKind) -> f64 {
        match kind {
            NeedKind::Hunger => self.hunger,
            NeedKind::Cleanliness => self.cleanliness,
            NeedKind::Happiness => self.happiness,
        }
    }

    /// Write one axis, clamped to `[0, 100]`. Non-finite values are ignored.
    /// Returns the stored level.
    pub fn set(&mut self, kind: NeedKind, level: f64) -> f64 {
        if !level.is_finite() {
            return self.get(kind);
        }
        let clamped = level.clamp(MIN_NEED, MAX_NEED);
        match kind {
            NeedKind::Hunger => self.hunger = clamped,
            NeedKind::Cleanliness => self.cleanliness = clamped,
            NeedKind::Happiness => self.happiness = clamped,
        }
        clamped
    }

    /// Descriptive band for one axis.
    pub fn band(&self, kind: NeedKind) -> NeedBand {
        NeedBand::classify(kind, self.get(kind))
    }
}

impl Default for NeedLevels {
    fn default() -> Self {
        Self::full()
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Everything the renderer needs to draw one pet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PetSnapshot {
    /// The pet.
    pub id: AgentId,
    /// Horizontal position on the ground line.
    pub x: f64,
    /// Facing direction.
    pub facing: Facing,
    /// Current activity.
    pub activity: Activity,
    /// Current need levels.
    pub needs: NeedLevels,
    /// Item being pursued, if any.
    pub pursuing: Option<ItemId>,
    /// Whether the pet is under explicit command or mid-pursuit.
    pub externally_directed: bool,
    /// Whether this pet is the target of the command surface.
    pub is_active: bool,
}

/// Everything the renderer needs to draw one dropped item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ResourceSnapshot {
    /// The item.
    pub id: ItemId,
    /// Food, waste, or toy.
    pub kind: ResourceKind,
    /// Horizontal position on the ground line.
    pub x: f64,
    /// Simulation time the item was created, in milliseconds.
    pub created_at_ms: u64,
    /// Simulation time the item expires, if it has a lifetime.
    pub expires_at_ms: Option<u64>,
    /// The pet currently holding a claim on the item.
    pub claimed_by: Option<AgentId>,
}

/// Per-pet row of [`Stats`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PetStats {
    /// The pet.
    pub id: AgentId,
    /// Current activity.
    pub activity: Activity,
    /// Raw need levels.
    pub needs: NeedLevels,
    /// Band of the hunger level.
    pub hunger_band: NeedBand,
    /// Band of the cleanliness level.
    pub cleanliness_band: NeedBand,
    /// Band of the happiness level.
    pub happiness_band: NeedBand,
}

/// Aggregate stats for the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Stats {
    /// The pet commands default to.
    pub active: Option<AgentId>,
    /// One row per live pet.
    pub pets: Vec<PetStats>,
    /// Units held per supply.
    pub inventory: BTreeMap<Supply, u32>,
    /// Current token balance.
    #[ts(as = "String")]
    pub balance: Decimal,
}
