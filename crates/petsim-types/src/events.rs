//! Reconciliation boundary types.
//!
//! Inbound events come from the remote authority as plain structured
//! values; outbound intents are what the local simulation asks the
//! authority to do. Wire encoding and connection handling live outside
//! this workspace.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::enums::{Activity, Facing, ResourceKind, Supply};
use crate::ids::{AgentId, ItemId, RequestId};

/// What kind of entity an inbound event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum EntityKind {
    /// A pet.
    Pet,
    /// A dropped item of the given kind.
    Item {
        /// Food, waste, or toy.
        kind: ResourceKind,
    },
    /// The player's wallet: token balance and inventory counts.
    Wallet,
}

/// A partial state patch. Absent fields leave local state untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export, export_to = "bindings/")]
pub struct EntityFields {
    /// Horizontal position.
    pub x: Option<f64>,
    /// Movement speed in pixels per second.
    pub speed: Option<f64>,
    /// Facing direction.
    pub facing: Option<Facing>,
    /// Current activity.
    pub activity: Option<Activity>,
    /// Hunger level.
    pub hunger: Option<f64>,
    /// Cleanliness level.
    pub cleanliness: Option<f64>,
    /// Happiness level.
    pub happiness: Option<f64>,
    /// Whether the pet is pursuing an item.
    pub pursuing: Option<bool>,
    /// The item the pet is pursuing.
    pub target_item: Option<ItemId>,
    /// Remaining lifetime of an item, in milliseconds.
    pub ttl_ms: Option<u64>,
    /// Purchase request this item confirms.
    pub request_id: Option<RequestId>,
    /// Authoritative token balance.
    #[ts(as = "Option<String>")]
    pub balance: Option<Decimal>,
    /// Authoritative inventory counts. Only listed supplies are overwritten.
    pub inventory: Option<BTreeMap<Supply, u32>>,
}

impl EntityFields {
    /// Whether the patch carries no fields at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A single field update delivered by `FieldChanged`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum FieldChange {
    /// Horizontal position.
    X {
        /// New value.
        value: f64,
    },
    /// Movement speed.
    Speed {
        /// New value.
        value: f64,
    },
    /// Activity.
    Activity {
        /// New value.
        value: Activity,
    },
    /// Hunger level.
    Hunger {
        /// New value.
        value: f64,
    },
    /// Cleanliness level.
    Cleanliness {
        /// New value.
        value: f64,
    },
    /// Happiness level.
    Happiness {
        /// New value.
        value: f64,
    },
    /// Token balance.
    Balance {
        /// New value.
        #[ts(as = "String")]
        value: Decimal,
    },
    /// Count held of one supply.
    Inventory {
        /// Which supply.
        supply: Supply,
        /// New count.
        count: u32,
    },
}

impl FieldChange {
    /// Express the change as a single-field patch.
    pub fn into_fields(self) -> EntityFields {
        let mut fields = EntityFields::default();
        match self {
            Self::X { value } => fields.x = Some(value),
            Self::Speed { value } => fields.speed = Some(value),
            Self::Activity { value } => fields.activity = Some(value),
            Self::Hunger { value } => fields.hunger = Some(value),
            Self::Cleanliness { value } => fields.cleanliness = Some(value),
            Self::Happiness { value } => fields.happiness = Some(value),
            Self::Balance { value } => fields.balance = Some(value),
            Self::Inventory { supply, count } => {
                fields.inventory = Some(BTreeMap::from([(supply, count)]));
            }
        }
        fields
    }
}

/// Why the authority refused an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum RejectionReason {
    /// The wallet could not cover the price.
    InsufficientBalance,
    /// The inventory line is at its cap.
    InventoryFull,
    /// Any other refusal.
    Refused,
}

/// An event received from the remote authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum InboundEvent {
    /// An entity was observed: create it if unknown, else patch present fields.
    EntityUpserted {
        /// What the entity is.
        kind: EntityKind,
        /// Authority-assigned identifier.
        id: Uuid,
        /// Fields carried by the observation.
        fields: EntityFields,
    },
    /// An entity no longer exists.
    EntityRemoved {
        /// What the entity was.
        kind: EntityKind,
        /// Authority-assigned identifier.
        id: Uuid,
    },
    /// One field of a known entity changed.
    FieldChanged {
        /// The entity.
        entity_id: Uuid,
        /// The new value.
        change: FieldChange,
    },
    /// The authority refused an outbound intent.
    IntentRejected {
        /// The refused request.
        request: RequestId,
        /// Why it was refused.
        reason: RejectionReason,
    },
}

/// A request sent to the remote authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Intent {
    /// Buy one unit of a supply, optionally dropping it at `drop_x`.
    Purchase {
        /// Correlation id echoed back on confirmation.
        request: RequestId,
        /// What is bought.
        supply: Supply,
        /// Price at the time of the request.
        #[ts(as = "String")]
        price: Decimal,
        /// Where to drop it, if it is dropped immediately.
        drop_x: Option<f64>,
        /// Whether local state already reflects the purchase.
        settled_locally: bool,
    },
    /// A locally dropped item now exists.
    ItemDropped {
        /// The item.
        item: ItemId,
        /// Its kind.
        kind: ResourceKind,
        /// Its position.
        x: f64,
    },
    /// A pet consumed an item.
    ItemConsumed {
        /// The consumer.
        agent: AgentId,
        /// The item.
        item: ItemId,
    },
    /// The cleanup tool removed an item.
    ItemCleaned {
        /// The item.
        item: ItemId,
    },
    /// A pet was removed locally.
    PetRemoved {
        /// The pet.
        agent: AgentId,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn field_change_becomes_single_field_patch() {
        let fields = FieldChange::Hunger { value: 42.0 }.into_fields();
        assert_eq!(fields.hunger, Some(42.0));
        assert!(fields.x.is_none());
        assert!(!fields.is_empty());
    }

    #[test]
    fn inventory_change_lists_only_that_supply() {
        let fields = FieldChange::Inventory {
            supply: Supply::Toy,
            count: 3,
        }
        .into_fields();
        let inventory = fields.inventory.unwrap();
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory.get(&Supply::Toy), Some(&3));
    }

    #[test]
    fn missing_fields_deserialize_as_absent() {
        let fields: EntityFields = serde_json::from_str(r#"{"x": 120.0}"#).unwrap();
        assert_eq!(fields.x, Some(120.0));
        assert!(fields.hunger.is_none());
        assert!(fields.balance.is_none());
    }
}
