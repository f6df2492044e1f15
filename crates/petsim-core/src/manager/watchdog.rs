//! Periodic invariant repair.
//!
//! Flags on a pet can drift into combinations no code path should leave
//! behind (a missed timer, a remote overwrite landing mid-pursuit). The
//! watchdog sweeps every pet and the claim table and forces each
//! inconsistency back to a safe state, logging a warning per repair.
//!
//! # Checks
//!
//! - **Stuck resolving**: resolving for longer than the stuck threshold with
//!   no pursuit.
//! - **Orphaned direction**: externally directed, not pursuing, and doing a
//!   plain locomotion activity.
//! - **Orphaned chase**: the chasing flag set with no pursuit.
//! - **Stale claim**: a claim whose holder is gone or pursues something else.
//! - **Unclaimed pursuit**: a pursuit whose item the pet does not hold.

use petsim_types::{AgentId, ItemId, Notification};
use tracing::warn;

use super::PetManager;

/// One repair applied by the watchdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repair {
    /// A pet stuck in a resolving state was returned to walking.
    StuckResolving {
        /// The repaired pet.
        agent: AgentId,
    },
    /// An externally directed flag with nothing behind it was cleared.
    OrphanedDirection {
        /// The repaired pet.
        agent: AgentId,
    },
    /// A chasing flag with no pursuit was cleared.
    OrphanedChase {
        /// The repaired pet.
        agent: AgentId,
    },
    /// A claim nobody was acting on was released.
    StaleClaim {
        /// The recorded holder.
        agent: AgentId,
        /// The released item.
        item: ItemId,
    },
    /// A pursuit without a matching claim was ended.
    UnclaimedPursuit {
        /// The pursuing pet.
        agent: AgentId,
        /// The item it was heading to.
        item: ItemId,
    },
}

impl PetManager {
    /// Sweep every pet and the claim table. Returns the repairs applied.
    pub fn run_watchdog(&mut self) -> Vec<Repair> {
        let now = self.clock.now_ms();
        let mut repairs = Vec::new();
        for id in self.pet_ids() {
            repairs.extend(self.repair_pet(id, now));
        }
        repairs.extend(self.audit_claims(now));
        repairs
    }

    /// Check one pet's flag combinations and force any inconsistency back
    /// to walking.
    pub(crate) fn repair_pet(&mut self, id: AgentId, now: u64) -> Vec<Repair> {
        let stuck_after = self.config.timing.stuck_threshold_ms;
        let Some(slot) = self.pets.get_mut(&id) else {
            return Vec::new();
        };
        let pet = &mut slot.pet;
        if pet.is_pursuing() {
            return Vec::new();
        }

        let mut repairs = Vec::new();
        let stuck = pet
            .resolving()
            .is_some_and(|r| now.saturating_sub(r.since_ms) >= stuck_after);
        if stuck {
            warn!(agent = %id, activity = ?pet.activity(), "pet stuck resolving, forcing walk");
            pet.force_locomotion();
            repairs.push(Repair::StuckResolving { agent: id });
        }
        if pet.is_externally_directed()
            && pet.resolving().is_none()
            && pet.activity().is_locomotion()
        {
            warn!(agent = %id, activity = ?pet.activity(), "directed flag without a command, clearing");
            pet.force_locomotion();
            repairs.push(Repair::OrphanedDirection { agent: id });
        }
        if pet.is_chasing() {
            warn!(agent = %id, "chasing without a target, clearing");
            pet.force_locomotion();
            repairs.push(Repair::OrphanedChase { agent: id });
        }
        repairs
    }

    /// Reconcile the claim table against what pets are actually doing.
    fn audit_claims(&mut self, now: u64) -> Vec<Repair> {
        let mut repairs = Vec::new();

        for (item, agent) in self.pool.arbiter().claims() {
            let pursuing = self
                .pets
                .get(&agent)
                .and_then(|slot| slot.pet.pursuit())
                .is_some_and(|p| p.item == item);
            if !pursuing {
                warn!(agent = %agent, item = %item, "releasing stale claim");
                self.pool.release_item(item);
                repairs.push(Repair::StaleClaim { agent, item });
            }
        }

        let unclaimed: Vec<(AgentId, ItemId)> = self
            .pets
            .iter()
            .filter_map(|(id, slot)| slot.pet.pursuit().map(|p| (*id, p.item)))
            .filter(|(id, item)| self.pool.arbiter().holder_of(*item) != Some(*id))
            .collect();
        for (agent, item) in unclaimed {
            let Some(slot) = self.pets.get_mut(&agent) else {
                continue;
            };
            let kind = slot.pet.pursuit().map(|p| p.kind);
            slot.pet.end_pursuit();
            let need = kind.and_then(|kind| slot.needs.seeker_of(kind));
            warn!(agent = %agent, item = %item, "pursuit without a claim, ending it");
            self.notify(Notification::PursuitEnded { agent, item });
            match need {
                Some(need) => self.schedule_recovery(agent, need, now),
                None => {
                    if let Some(slot) = self.pets.get_mut(&agent) {
                        slot.pet.force_locomotion();
                    }
                }
            }
            repairs.push(Repair::UnclaimedPursuit { agent, item });
        }

        repairs
    }
}
