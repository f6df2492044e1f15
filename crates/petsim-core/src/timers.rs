//! Deterministic timer queue.
//!
//! Scheduled callbacks (item expiry, post-consumption follow-up, recovery
//! after a lost target, settle checks) are data, not closures: a
//! [`TimerEvent`] names the entity it concerns and the orchestrator looks
//! the entity up again when the timer fires. A timer whose entity is gone
//! is therefore a no-op by construction.
//!
//! Timers fire only on tick boundaries, in `(due_ms, sequence)` order, so
//! two timers due at the same millisecond fire in the order they were
//! scheduled.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use petsim_types::{AgentId, ItemId, NeedKind};

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// An item's lifetime ran out.
    Expire {
        /// The item.
        item: ItemId,
    },
    /// Re-evaluate a pet after it finished resolving a need.
    FollowUp {
        /// The pet.
        agent: AgentId,
        /// The resolved need.
        need: NeedKind,
    },
    /// Re-evaluate a pet whose pursued item disappeared.
    Recovery {
        /// The pet.
        agent: AgentId,
        /// The need the lost item would have served.
        need: NeedKind,
    },
    /// Double-check a pet shortly after it was forced back to walking.
    SettleCheck {
        /// The pet.
        agent: AgentId,
    },
}

impl TimerEvent {
    /// The pet this timer concerns, if any.
    pub const fn agent(&self) -> Option<AgentId> {
        match self {
            Self::FollowUp { agent, .. }
            | Self::Recovery { agent, .. }
            | Self::SettleCheck { agent } => Some(*agent),
            Self::Expire { .. } => None,
        }
    }

    /// The item this timer concerns, if any.
    pub const fn item(&self) -> Option<ItemId> {
        match self {
            Self::Expire { item } => Some(*item),
            Self::FollowUp { .. } | Self::Recovery { .. } | Self::SettleCheck { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Scheduled {
    due_ms: u64,
    sequence: u64,
    event: TimerEvent,
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due_ms
            .cmp(&other.due_ms)
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

/// Min-heap of pending timers.
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Reverse<Scheduled>>,
    next_sequence: u64,
}

impl TimerQueue {
    /// An empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `event` to fire at the first tick boundary at or after `due_ms`.
    pub fn schedule(&mut self, due_ms: u64, event: TimerEvent) {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.saturating_add(1);
        self.heap.push(Reverse(Scheduled {
            due_ms,
            sequence,
            event,
        }));
    }

    /// Cancel every timer concerning `agent`. Returns how many were dropped.
    pub fn cancel_for_agent(&mut self, agent: AgentId) -> usize {
        self.cancel_where(|event| event.agent() == Some(agent))
    }

    /// Cancel every timer concerning `item`. Returns how many were dropped.
    pub fn cancel_for_item(&mut self, item: ItemId) -> usize {
        self.cancel_where(|event| event.item() == Some(item))
    }

    /// Cancel every timer matching `predicate`.
    pub fn cancel_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&TimerEvent) -> bool,
    {
        let before = self.heap.len();
        self.heap
            .retain(|Reverse(scheduled)| !predicate(&scheduled.event));
        before.saturating_sub(self.heap.len())
    }

    /// Remove and return every timer due at or before `now_ms`, in firing order.
    pub fn pop_due(&mut self, now_ms: u64) -> Vec<TimerEvent> {
        let mut due = Vec::new();
        while self
            .heap
            .peek()
            .is_some_and(|Reverse(next)| next.due_ms <= now_ms)
        {
            if let Some(Reverse(scheduled)) = self.heap.pop() {
                due.push(scheduled.event);
            }
        }
        due
    }

    /// Number of pending timers.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether no timers are pending.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Whether any pending timer matches `predicate`.
    pub fn any<F>(&self, mut predicate: F) -> bool
    where
        F: FnMut(&TimerEvent) -> bool,
    {
        self.heap.iter().any(|Reverse(scheduled)| predicate(&scheduled.event))
    }
}
