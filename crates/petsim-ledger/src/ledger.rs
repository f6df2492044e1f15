//! The token ledger interface and its in-memory implementation.
//!
//! The simulation core asks exactly three questions of a wallet: how much is
//! there, can I spend this, and credit this back. A fourth call,
//! [`TokenLedger::set_balance`], lets an authoritative remote source overwrite
//! the balance outright.
//!
//! # Design
//!
//! - **Append-only**: [`LocalLedger`] records every movement as a
//!   [`LedgerEntry`]; entries are never modified or deleted.
//! - **Never negative**: a spend larger than the balance is refused and
//!   leaves the balance untouched.
//! - **Precision**: all amounts use [`Decimal`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::LedgerError;

/// Narrow wallet interface consumed by the simulation core.
pub trait TokenLedger: Send {
    /// Current balance.
    fn balance(&self) -> Decimal;

    /// Spend `amount` if the balance covers it. Returns the new balance.
    ///
    /// On failure the balance is unchanged.
    fn try_spend(&mut self, amount: Decimal, reason: &str) -> Result<Decimal, LedgerError>;

    /// Add `amount` to the balance. Returns the new balance.
    fn credit(&mut self, amount: Decimal, reason: &str) -> Result<Decimal, LedgerError>;

    /// Overwrite the balance with an authoritative value.
    fn set_balance(&mut self, amount: Decimal) -> Result<Decimal, LedgerError>;
}

/// Kind of balance movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// Tokens left the wallet.
    Spend,
    /// Tokens entered the wallet.
    Credit,
    /// The balance was replaced by an authoritative value.
    Overwrite,
}

/// One recorded balance movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Position in the log, starting at 0.
    pub sequence: u64,
    /// What happened.
    pub kind: EntryKind,
    /// Amount moved (for overwrites, the new balance).
    pub amount: Decimal,
    /// Balance after the movement.
    pub balance_after: Decimal,
    /// Human-readable reason (e.g. "purchase Food").
    pub reason: String,
    /// Wall-clock time of the movement.
    pub recorded_at: DateTime<Utc>,
}

/// In-memory append-only token ledger.
#[derive(Debug, Clone)]
pub struct LocalLedger {
    balance: Decimal,
    entries: Vec<LedgerEntry>,
}

impl LocalLedger {
    /// Create a ledger holding `opening` tokens. Negative openings are
    /// clamped to zero.
    pub fn new(opening: Decimal) -> Self {
        Self {
            balance: opening.max(Decimal::ZERO),
            entries: Vec::new(),
        }
    }

    /// All recorded movements, oldest first.
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    fn record(&mut self, kind: EntryKind, amount: Decimal, reason: &str) {
        let sequence = u64::try_from(self.entries.len()).unwrap_or(u64::MAX);
        debug!(
            sequence,
            kind = ?kind,
            amount = %amount,
            balance = %self.balance,
            reason,
            "ledger entry recorded"
        );
        self.entries.push(LedgerEntry {
            sequence,
            kind,
            amount,
            balance_after: self.balance,
            reason: reason.to_owned(),
            recorded_at: Utc::now(),
        });
    }
}

impl Default for LocalLedger {
    fn default() -> Self {
        Self::new(Decimal::ZERO)
    }
}

impl TokenLedger for LocalLedger {
    fn balance(&self) -> Decimal {
        self.balance
    }

    fn try_spend(&mut self, amount: Decimal, reason: &str) -> Result<Decimal, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveAmount { amount });
        }
        if amount > self.balance {
            return Err(LedgerError::InsufficientBalance {
                requested: amount,
                available: self.balance,
            });
        }
        self.balance = self
            .balance
            .checked_sub(amount)
            .ok_or(LedgerError::Overflow)?;
        self.record(EntryKind::Spend, amount, reason);
        Ok(self.balance)
    }

    fn credit(&mut self, amount: Decimal, reason: &str) -> Result<Decimal, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveAmount { amount });
        }
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        self.record(EntryKind::Credit, amount, reason);
        Ok(self.balance)
    }

    fn set_balance(&mut self, amount: Decimal) -> Result<Decimal, LedgerError> {
        if amount < Decimal::ZERO {
            return Err(LedgerError::NegativeBalance { amount });
        }
        self.balance = amount;
        self.record(EntryKind::Overwrite, amount, "authoritative balance");
        Ok(self.balance)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tokens(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    #[test]
    fn new_ledger_has_opening_balance() {
        let ledger = LocalLedger::new(tokens(100));
        assert_eq!(ledger.balance(), tokens(100));
        assert!(ledger.entries().is_empty());
    }

    #[test]
    fn spend_reduces_balance_and_logs() {
        let mut ledger = LocalLedger::new(tokens(10));
        let after = ledger.try_spend(tokens(3), "purchase Food").unwrap();
        assert_eq!(after, tokens(7));
        assert_eq!(ledger.entries().len(), 1);
        let entry = ledger.entries().first().unwrap();
        assert_eq!(entry.kind, EntryKind::Spend);
        assert_eq!(entry.balance_after, tokens(7));
    }

    #[test]
    fn overspend_is_refused_without_mutation() {
        let mut ledger = LocalLedger::new(tokens(4));
        let result = ledger.try_spend(tokens(5), "purchase Food");
        assert_eq!(
            result,
            Err(LedgerError::InsufficientBalance {
                requested: tokens(5),
                available: tokens(4),
            })
        );
        assert_eq!(ledger.balance(), tokens(4));
        assert!(ledger.entries().is_empty());
    }

    #[test]
    fn zero_and_negative_amounts_rejected() {
        let mut ledger = LocalLedger::new(tokens(4));
        assert!(ledger.try_spend(Decimal::ZERO, "noop").is_err());
        assert!(ledger.credit(tokens(-1), "noop").is_err());
        assert!(ledger.set_balance(tokens(-1)).is_err());
    }

    #[test]
    fn credit_and_overwrite() {
        let mut ledger = LocalLedger::new(tokens(1));
        ledger.credit(tokens(9), "refund").unwrap();
        assert_eq!(ledger.balance(), tokens(10));
        ledger.set_balance(tokens(55)).unwrap();
        assert_eq!(ledger.balance(), tokens(55));
        assert_eq!(ledger.entries().last().unwrap().kind, EntryKind::Overwrite);
    }

    #[test]
    fn entries_serialize() {
        let mut ledger = LocalLedger::new(tokens(5));
        ledger.try_spend(tokens(5), "purchase Toy").unwrap();
        let json = serde_json::to_string(ledger.entries()).unwrap();
        assert!(json.contains("purchase Toy"));
    }
}
