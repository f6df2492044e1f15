//! In-process stand-in for the remote authority.
//!
//! [`LoopbackAuthority`] consumes the intents the runner forwards and, for
//! purchases the local side has not settled, answers the way a server
//! would: it debits its own copy of the wallet and either upserts the
//! bought item (carrying the request id) or rejects the request. When the
//! local side uses a held unit it publishes the new wallet values, since
//! the counters are its to keep. Replies go
//! back into the runner's input channel through a weak sender, so the
//! authority never keeps a run alive on its own.

use std::collections::BTreeMap;

use petsim_core::RunnerInput;
use petsim_types::{
    EntityFields, EntityKind, InboundEvent, Intent, RejectionReason, RequestId, Supply,
};
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Counters reported when the authority shuts down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthorityStats {
    /// Intents received.
    pub intents: u64,
    /// Purchases confirmed.
    pub confirmed: u64,
    /// Purchases rejected.
    pub rejected: u64,
    /// Replies dropped because the input channel was full.
    pub dropped_replies: u64,
}

/// Authoritative wallet and purchase settlement.
#[derive(Debug)]
pub struct LoopbackAuthority {
    wallet_id: Uuid,
    balance: Decimal,
    inventory: BTreeMap<Supply, u32>,
    stats: AuthorityStats,
}

impl LoopbackAuthority {
    /// An authority holding `balance` tokens and an empty inventory.
    pub fn new(balance: Decimal) -> Self {
        Self {
            wallet_id: Uuid::new_v4(),
            balance,
            inventory: Supply::ALL.into_iter().map(|supply| (supply, 0)).collect(),
            stats: AuthorityStats::default(),
        }
    }

    /// Current authoritative balance.
    pub const fn balance(&self) -> Decimal {
        self.balance
    }

    /// Counters so far.
    pub const fn stats(&self) -> AuthorityStats {
        self.stats
    }

    /// Process one intent and return the events to send back.
    pub fn handle(&mut self, intent: Intent) -> Vec<InboundEvent> {
        self.stats.intents = self.stats.intents.saturating_add(1);
        match intent {
            Intent::Purchase {
                request,
                supply,
                price,
                drop_x,
                settled_locally,
            } => {
                if settled_locally {
                    self.record_mirror(supply, price);
                    Vec::new()
                } else {
                    self.settle(request, supply, price, drop_x)
                }
            }
            Intent::ItemDropped { item, kind, .. } => match kind.supply() {
                Some(supply) if self.take(supply) => {
                    debug!(item = %item, supply = ?supply, "held unit dropped");
                    vec![self.wallet_update(None)]
                }
                _ => Vec::new(),
            },
            Intent::ItemCleaned { item } => {
                if self.take(Supply::CleaningTool) {
                    debug!(item = %item, "cleaning tool used");
                    vec![self.wallet_update(None)]
                } else {
                    Vec::new()
                }
            }
            other => {
                debug!(intent = ?other, "intent recorded");
                Vec::new()
            }
        }
    }

    fn record_mirror(&mut self, supply: Supply, price: Decimal) {
        self.balance = self
            .balance
            .checked_sub(price)
            .unwrap_or(Decimal::ZERO)
            .max(Decimal::ZERO);
        self.give(supply);
        debug!(supply = ?supply, balance = %self.balance, "locally settled purchase mirrored");
    }

    /// Count of one supply line.
    pub fn count(&self, supply: Supply) -> u32 {
        self.inventory.get(&supply).copied().unwrap_or(0)
    }

    fn give(&mut self, supply: Supply) {
        let count = self.inventory.entry(supply).or_insert(0);
        *count = count.saturating_add(1);
    }

    /// Use one held unit. Returns `false` if none was held.
    fn take(&mut self, supply: Supply) -> bool {
        match self.inventory.get_mut(&supply) {
            Some(count) if *count > 0 => {
                *count = count.saturating_sub(1);
                true
            }
            _ => false,
        }
    }

    fn settle(
        &mut self,
        request: RequestId,
        supply: Supply,
        price: Decimal,
        drop_x: Option<f64>,
    ) -> Vec<InboundEvent> {
        if self.balance < price {
            self.stats.rejected = self.stats.rejected.saturating_add(1);
            warn!(request = %request, supply = ?supply, balance = %self.balance, "rejecting purchase");
            return vec![InboundEvent::IntentRejected {
                request,
                reason: RejectionReason::InsufficientBalance,
            }];
        }
        let Some(balance) = self.balance.checked_sub(price) else {
            self.stats.rejected = self.stats.rejected.saturating_add(1);
            return vec![InboundEvent::IntentRejected {
                request,
                reason: RejectionReason::Refused,
            }];
        };
        self.balance = balance;
        self.stats.confirmed = self.stats.confirmed.saturating_add(1);
        info!(request = %request, supply = ?supply, balance = %self.balance, "purchase confirmed");

        let mut replies = Vec::with_capacity(2);
        match (supply.drops(), drop_x) {
            (Some(kind), Some(x)) => {
                replies.push(InboundEvent::EntityUpserted {
                    kind: EntityKind::Item { kind },
                    id: Uuid::now_v7(),
                    fields: EntityFields {
                        x: Some(x),
                        request_id: Some(request),
                        ..EntityFields::default()
                    },
                });
                replies.push(self.wallet_update(None));
            }
            _ => {
                self.give(supply);
                replies.push(self.wallet_update(Some(request)));
            }
        }
        replies
    }

    fn wallet_update(&self, request: Option<RequestId>) -> InboundEvent {
        InboundEvent::EntityUpserted {
            kind: EntityKind::Wallet,
            id: self.wallet_id,
            fields: EntityFields {
                balance: Some(self.balance),
                inventory: Some(self.inventory.clone()),
                request_id: request,
                ..EntityFields::default()
            },
        }
    }
}

/// Serve intents until the runner drops its sender. Replies that find the
/// input closed or full are dropped.
pub async fn run_authority(
    mut authority: LoopbackAuthority,
    mut intents: mpsc::Receiver<Intent>,
    input: mpsc::WeakSender<RunnerInput>,
) -> AuthorityStats {
    while let Some(intent) = intents.recv().await {
        let replies = authority.handle(intent);
        if replies.is_empty() {
            continue;
        }
        let Some(sender) = input.upgrade() else {
            debug!("input closed, authority replies dropped");
            continue;
        };
        for reply in replies {
            match sender.try_send(RunnerInput::Inbound(reply)) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    authority.stats.dropped_replies =
                        authority.stats.dropped_replies.saturating_add(1);
                    warn!("input channel full, authority reply dropped");
                }
                Err(TrySendError::Closed(_)) => break,
            }
        }
    }
    let stats = authority.stats();
    info!(
        intents = stats.intents,
        confirmed = stats.confirmed,
        rejected = stats.rejected,
        balance = %authority.balance(),
        food = authority.count(Supply::Food),
        cleaning_tools = authority.count(Supply::CleaningTool),
        toys = authority.count(Supply::Toy),
        "authority stopped"
    );
    stats
}
