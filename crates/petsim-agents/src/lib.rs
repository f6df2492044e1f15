//! Pet state, movement, needs, and idle activity for the pet simulation.
//!
//! This crate is the logic layer for a single pet: everything that operates
//! on one pet's state without owning shared resources. The shared pool is
//! reached only through the [`ResourceHost`] capability; orchestration,
//! timers, and the watchdog live in `petsim-core`.
//!
//! # Modules
//!
//! - [`activity`] -- Autonomous idle bursts ([`ActivityComponent`])
//! - [`config`] -- Tunables for movement, needs, and activity
//! - [`decay`] -- Elapsed-time need decay
//! - [`error`] -- Validation errors ([`AgentError`])
//! - [`host`] -- The [`ResourceHost`] capability trait
//! - [`movement`] -- Pacing and pursuit ([`Movement`], [`Arena`])
//! - [`needs`] -- Feeding, cleanliness, and happiness ([`NeedSystem`])
//! - [`pet`] -- The pet entity ([`Pet`])

pub mod activity;
pub mod config;
pub mod decay;
pub mod error;
pub mod host;
pub mod movement;
pub mod needs;
pub mod pet;

// Re-export primary types at crate root for convenience.
pub use activity::{ActivityComponent, ActivityEvent};
pub use config::{ActivityConfig, EmissionConfig, MovementConfig, NeedConfig, NeedsConfig};
pub use error::AgentError;
pub use host::{ConsumedItem, ResourceHost};
pub use movement::{Arena, Movement, MovementOutcome};
pub use needs::{ArrivalOutcome, Emission, NeedSet, NeedSystem, Reevaluation, SeekOutcome};
pub use pet::{Pet, Pursuit, PursuitEnded, Resolving};
