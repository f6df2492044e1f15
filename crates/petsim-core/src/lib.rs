//! Simulation clock, resource contention, and orchestration for the pet
//! simulation.
//!
//! This crate owns everything shared between pets: the resource pool and
//! its claim table, the deterministic timer queue, the agent manager that
//! drives each tick, and the adapter that reconciles local state with a
//! remote authority.
//!
//! # Modules
//!
//! - [`arbiter`] -- The [`ContentionArbiter`] claim table.
//! - [`clock`] -- Simulated time and tick counter.
//! - [`config`] -- Configuration loading from `petsim-config.yaml` into
//!   strongly-typed structs.
//! - [`control`] -- Shared pause, speed, and stop state for the tick loop.
//! - [`manager`] -- The [`PetManager`] orchestrator, command surface, and
//!   watchdog.
//! - [`pool`] -- The [`ResourcePool`] of live items.
//! - [`reconcile`] -- The [`ReconciliationAdapter`].
//! - [`runner`] -- The async fixed-rate tick loop.
//! - [`timers`] -- Deterministic scheduled callbacks.

pub mod arbiter;
pub mod clock;
pub mod config;
pub mod control;
pub mod manager;
pub mod pool;
pub mod reconcile;
pub mod runner;
pub mod timers;

// Re-export primary types at crate root for convenience.
pub use arbiter::{ClaimError, ContentionArbiter};
pub use clock::{ClockError, SimClock};
pub use config::{AuthorityPolicy, ConfigError, SimulationConfig};
pub use control::{RunControl, RunEndReason};
pub use manager::{CommandError, PetManager, Repair, TickError, TickReport};
pub use pool::{RemovedItem, ResourceItem, ResourcePool};
pub use reconcile::{ApplyOutcome, PendingPurchase, ReconcileError, ReconciliationAdapter};
pub use runner::{
    NoOpCallback, RunSummary, RunnerChannels, RunnerError, RunnerInput, TickCallback,
    log_run_end, run_simulation,
};
pub use timers::{TimerEvent, TimerQueue};
