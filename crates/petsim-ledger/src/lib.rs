//! Token ledger and supply inventory for the pet simulation.
//!
//! The wallet is an external collaborator of the simulation core. The core
//! only sees it through the narrow [`TokenLedger`] interface; this crate
//! also provides [`LocalLedger`], an in-memory append-only implementation
//! used offline and in tests, and the [`Inventory`] of purchased supplies.
//!
//! # Modules
//!
//! - [`ledger`] -- The [`TokenLedger`] trait and the [`LocalLedger`] log.
//! - [`inventory`] -- Capped, never-negative supply counters.
//!
//! The ledger never panics; every fallible operation returns a
//! [`LedgerError`].

pub mod inventory;
pub mod ledger;

use petsim_types::Supply;
use rust_decimal::Decimal;

// Re-export primary types at crate root.
pub use inventory::{Inventory, InventoryCaps};
pub use ledger::{EntryKind, LedgerEntry, LocalLedger, TokenLedger};

/// Errors from ledger and inventory operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Amounts must be strictly positive.
    #[error("amount must be positive, got {amount}")]
    NonPositiveAmount {
        /// The rejected amount.
        amount: Decimal,
    },

    /// Balances can never be negative.
    #[error("balance must not be negative, got {amount}")]
    NegativeBalance {
        /// The rejected balance.
        amount: Decimal,
    },

    /// The balance does not cover the spend.
    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance {
        /// Amount that was requested.
        requested: Decimal,
        /// Balance at the time of the request.
        available: Decimal,
    },

    /// The inventory line is at its cap.
    #[error("inventory full for {supply:?} (cap {cap})")]
    InventoryFull {
        /// The supply line.
        supply: Supply,
        /// Its cap.
        cap: u32,
    },

    /// Nothing left to take from the inventory line.
    #[error("no {supply:?} left in inventory")]
    InventoryEmpty {
        /// The supply line.
        supply: Supply,
    },

    /// Decimal arithmetic overflowed.
    #[error("balance arithmetic overflow")]
    Overflow,
}
