//! Enumeration types for the pet simulation.
//!
//! Activities, resource kinds, need axes, purchasable supplies, facing and
//! edge memory for pacing, removal causes, and the descriptive need bands
//! shown to the host.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

/// What a pet is doing right now. Exactly one value holds at any instant.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub enum Activity {
    /// Default locomotion: pacing the arena or moving toward a pursuit target.
    #[default]
    Walking,
    /// Resting in place.
    Sleeping,
    /// Playing in place (idle burst or resolving a toy).
    Playing,
    /// Eating a consumed food item.
    Consuming,
}

impl Activity {
    /// The activity every pet returns to absent other drivers.
    pub const DEFAULT_LOCOMOTION: Self = Self::Walking;

    /// Whether this is the default locomotion activity.
    pub const fn is_locomotion(self) -> bool {
        matches!(self, Self::Walking)
    }
}

// ---------------------------------------------------------------------------
// Resources and supplies
// ---------------------------------------------------------------------------

/// The kind of a droppable item living in the resource pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ResourceKind {
    /// Food dropped by the player; sought by hungry pets.
    Food,
    /// Waste left behind by dirty pets; removed with the cleanup tool.
    Waste,
    /// A toy dropped by the player; sought by unhappy pets.
    Toy,
}

impl ResourceKind {
    /// The inventory supply that drops this kind, if the player can drop it.
    pub const fn supply(self) -> Option<Supply> {
        match self {
            Self::Food => Some(Supply::Food),
            Self::Toy => Some(Supply::Toy),
            Self::Waste => None,
        }
    }
}

/// A purchasable inventory line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Supply {
    /// One food item, dropped into the arena.
    Food,
    /// One use of the cleanup tool.
    CleaningTool,
    /// One toy, dropped into the arena.
    Toy,
}

impl Supply {
    /// All supplies in display order.
    pub const ALL: [Self; 3] = [Self::Food, Self::CleaningTool, Self::Toy];

    /// The resource kind spawned when this supply is dropped, if any.
    pub const fn drops(self) -> Option<ResourceKind> {
        match self {
            Self::Food => Some(ResourceKind::Food),
            Self::Toy => Some(ResourceKind::Toy),
            Self::CleaningTool => None,
        }
    }
}

/// Why an item left the resource pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum RemovalCause {
    /// A pet reached and consumed it.
    Consumed,
    /// Its time-to-live ran out.
    Expired,
    /// The player used the cleanup tool on it.
    CleanedUp,
    /// The remote authority reported it removed.
    Remote,
}

// ---------------------------------------------------------------------------
// Needs
// ---------------------------------------------------------------------------

/// One of the three decaying need axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum NeedKind {
    /// Replenished by eating food.
    Hunger,
    /// Replenished by the cleanup tool; low values produce waste.
    Cleanliness,
    /// Replenished by playing with toys.
    Happiness,
}

impl NeedKind {
    /// All need axes in evaluation order.
    pub const ALL: [Self; 3] = [Self::Hunger, Self::Cleanliness, Self::Happiness];
}

/// Descriptive band for a need level, shown by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum NeedBand {
    /// Hunger at or above 95.
    Full,
    /// Hunger or cleanliness in \[80, 95), happiness in \[60, 80).
    Normal,
    /// Hunger in \[30, 80).
    Hungry,
    /// Hunger below 30.
    Starving,
    /// Cleanliness at or above 95.
    Clean,
    /// Cleanliness in \[30, 80).
    Dirty,
    /// Cleanliness below 30.
    Filthy,
    /// Happiness at or above 95.
    Ecstatic,
    /// Happiness in \[80, 95).
    Happy,
    /// Happiness in \[30, 60).
    Sad,
    /// Happiness below 30.
    Depressed,
}

impl NeedBand {
    /// Classify a level on the given axis.
    pub fn classify(kind: NeedKind, level: f64) -> Self {
        match kind {
            NeedKind::Hunger => {
                if level >= 95.0 {
                    Self::Full
                } else if level >= 80.0 {
                    Self::Normal
                } else if level >= 30.0 {
                    Self::Hungry
                } else {
                    Self::Starving
                }
            }
            NeedKind::Cleanliness => {
                if level >= 95.0 {
                    Self::Clean
                } else if level >= 80.0 {
                    Self::Normal
                } else if level >= 30.0 {
                    Self::Dirty
                } else {
                    Self::Filthy
                }
            }
            NeedKind::Happiness => {
                if level >= 95.0 {
                    Self::Ecstatic
                } else if level >= 80.0 {
                    Self::Happy
                } else if level >= 60.0 {
                    Self::Normal
                } else if level >= 30.0 {
                    Self::Sad
                } else {
                    Self::Depressed
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Pacing
// ---------------------------------------------------------------------------

/// Horizontal facing direction.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub enum Facing {
    /// Facing toward decreasing x (-1).
    Left,
    /// Facing toward increasing x (+1).
    #[default]
    Right,
}

impl Facing {
    /// The direction as a signed unit step.
    pub const fn sign(self) -> f64 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    /// The opposite direction.
    pub const fn flipped(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Facing that points from `from` toward `to`. Keeps `self` when equal.
    pub fn toward(self, from: f64, to: f64) -> Self {
        if to > from {
            Self::Right
        } else if to < from {
            Self::Left
        } else {
            self
        }
    }
}

/// The arena edge a pacing pet last bounced off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum EdgeSide {
    /// The left wall.
    Left,
    /// The right wall.
    Right,
}
