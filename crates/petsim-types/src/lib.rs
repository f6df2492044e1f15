//! Shared type definitions for the pet simulation core.
//!
//! This crate is the single source of truth for the values that cross a
//! crate boundary: identifiers, enumerations, host-facing snapshots, and
//! the reconciliation vocabulary. Types flow to `TypeScript` via `ts-rs`
//! for the embedding host.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for pets, items, and requests
//! - [`enums`] -- Activities, resource kinds, need axes, supplies, facing
//! - [`structs`] -- Need levels and host snapshots
//! - [`events`] -- Inbound authority events and outbound intents
//! - [`notification`] -- UI notifications and the command surface

pub mod enums;
pub mod events;
pub mod ids;
pub mod notification;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Activity, EdgeSide, Facing, NeedBand, NeedKind, RemovalCause, ResourceKind, Supply};
pub use events::{EntityFields, EntityKind, FieldChange, InboundEvent, Intent, RejectionReason};
pub use ids::{AgentId, ItemId, RequestId};
pub use notification::{Command, CommandOutcome, Notification};
pub use structs::{MAX_NEED, MIN_NEED, NeedLevels, PetSnapshot, PetStats, ResourceSnapshot, Stats};
