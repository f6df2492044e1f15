//! Transient messages for the host UI and the command surface vocabulary.
//!
//! Notifications are fire-and-forget: the host shows them (toasts, sound
//! cues) and drops them. Commands are what a UI or CLI layer asks the
//! simulation to do; [`CommandOutcome`] is the synchronous answer.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Activity, NeedKind, RemovalCause, ResourceKind, Supply};
use crate::events::RejectionReason;
use crate::ids::{AgentId, ItemId, RequestId};

/// A transient, user-visible message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Notification {
    /// A purchase was refused for lack of tokens.
    InsufficientBalance {
        /// What was being bought.
        supply: Supply,
        /// Its price.
        #[ts(as = "String")]
        price: Decimal,
        /// The balance at the time.
        #[ts(as = "String")]
        balance: Decimal,
    },
    /// A purchase was refused because the inventory line is full.
    InventoryFull {
        /// The full supply.
        supply: Supply,
        /// Its cap.
        cap: u32,
    },
    /// A new item is available in the arena.
    ResourceAppeared {
        /// The item.
        item: ItemId,
        /// Its kind.
        kind: ResourceKind,
        /// Its position.
        x: f64,
    },
    /// An item left the arena.
    ResourceRemoved {
        /// The item.
        item: ItemId,
        /// Its kind.
        kind: ResourceKind,
        /// Why it left.
        cause: RemovalCause,
    },
    /// A pet started heading for an item.
    PursuitStarted {
        /// The pet.
        agent: AgentId,
        /// The claimed item.
        item: ItemId,
    },
    /// A pet stopped heading for an item.
    PursuitEnded {
        /// The pet.
        agent: AgentId,
        /// The released item.
        item: ItemId,
    },
    /// A pet consumed an item and a need was replenished.
    Consumed {
        /// The pet.
        agent: AgentId,
        /// The item.
        item: ItemId,
        /// The replenished need.
        need: NeedKind,
        /// The level after replenishment.
        level: f64,
    },
    /// The cleanup tool found no waste in reach.
    NothingToClean {
        /// Where the tool was used.
        x: f64,
    },
    /// A pet was created.
    AgentCreated {
        /// The pet.
        agent: AgentId,
    },
    /// A pet was removed.
    AgentRemoved {
        /// The pet.
        agent: AgentId,
    },
    /// The command target changed.
    ActiveAgentChanged {
        /// The new active pet, if any remain.
        agent: Option<AgentId>,
    },
    /// The authority refused a pending purchase.
    PurchaseRejected {
        /// The refused request.
        request: RequestId,
        /// Why.
        reason: RejectionReason,
    },
}

/// A request from the UI or CLI layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Command {
    /// Create a pet; a fresh id is generated when none is given.
    CreateAgent {
        /// Requested id.
        id: Option<AgentId>,
        /// Starting position.
        x: f64,
    },
    /// Remove a pet.
    RemoveAgent {
        /// The pet.
        agent: AgentId,
    },
    /// Point the command surface at a pet.
    SetActiveAgent {
        /// The pet.
        agent: AgentId,
    },
    /// Drop one unit of food or toy at `x`, buying it if none is held.
    PurchaseAndDrop {
        /// What to drop.
        kind: ResourceKind,
        /// Where to drop it.
        x: f64,
    },
    /// Use the cleanup tool at a point.
    UseCleanupTool {
        /// Horizontal coordinate.
        x: f64,
        /// Vertical coordinate (ignored: the arena is one-dimensional).
        y: f64,
    },
    /// Drop a toy at a point.
    UseToy {
        /// Horizontal coordinate.
        x: f64,
        /// Vertical coordinate (ignored: the arena is one-dimensional).
        y: f64,
    },
    /// Explicitly set a pet's activity (the active pet when `agent` is absent).
    DirectActivity {
        /// Target pet.
        agent: Option<AgentId>,
        /// The commanded activity.
        activity: Activity,
    },
    /// Force every pet back to default locomotion and drop every claim.
    ForceResetAll,
}

/// The synchronous answer to a successful [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum CommandOutcome {
    /// A pet was created.
    AgentCreated {
        /// The pet.
        agent: AgentId,
    },
    /// A pet was removed.
    AgentRemoved {
        /// The pet.
        agent: AgentId,
    },
    /// The active pet changed.
    ActiveAgentSet {
        /// The pet.
        agent: AgentId,
    },
    /// An item was dropped into the arena.
    Dropped {
        /// The new item.
        item: ItemId,
    },
    /// A purchase awaits confirmation from the authority.
    PurchasePending {
        /// Correlation id of the request.
        request: RequestId,
    },
    /// The cleanup tool removed a waste item.
    Cleaned {
        /// The removed item.
        item: ItemId,
    },
    /// The cleanup tool found nothing in reach.
    NothingToClean,
    /// A pet's activity was set explicitly.
    ActivityDirected {
        /// The pet.
        agent: AgentId,
    },
    /// Every pet was reset.
    Reset {
        /// How many pets were reset.
        agents: u32,
    },
}
