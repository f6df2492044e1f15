//! Error types for the petsim-agents crate.
//!
//! Pet state only fails on malformed input (non-finite coordinates, speeds,
//! or need levels arriving from outside the simulation). Everything else is
//! an invariant that the pet methods maintain by construction.

use petsim_types::NeedKind;

/// Errors that can occur when validating values applied to a pet.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AgentError {
    /// A position was NaN or infinite.
    #[error("invalid position: {x}")]
    InvalidPosition {
        /// The rejected coordinate.
        x: f64,
    },

    /// A speed was negative, NaN, or infinite.
    #[error("invalid speed: {speed}")]
    InvalidSpeed {
        /// The rejected speed.
        speed: f64,
    },

    /// A need level was outside `[0, 100]` or not finite.
    #[error("invalid {kind:?} level: {level}")]
    InvalidNeedLevel {
        /// The need axis.
        kind: NeedKind,
        /// The rejected level.
        level: f64,
    },
}
