//! Tick callback that logs periodic simulation stats.
//!
//! Every `every_ticks` ticks the callback reads [`Stats`] from the
//! manager and logs one summary line plus one debug line per pet, so a
//! headless run shows need bands moving and resources being fought over.

use petsim_core::{ReconciliationAdapter, TickCallback, TickReport};
use petsim_types::Stats;
use tracing::{debug, info};

/// Callback that logs stats on a fixed tick cadence.
pub struct StatsCallback {
    every_ticks: u64,
    repairs_total: u64,
    last: Option<Stats>,
}

impl StatsCallback {
    /// Log every `every_ticks` ticks (0 logs only at the end of the run).
    pub const fn new(every_ticks: u64) -> Self {
        Self {
            every_ticks,
            repairs_total: 0,
            last: None,
        }
    }

    /// Watchdog repairs seen across the run.
    pub const fn repairs_total(&self) -> u64 {
        self.repairs_total
    }

    /// The most recent stats captured.
    pub const fn last_stats(&self) -> Option<&Stats> {
        self.last.as_ref()
    }

    fn due(&self, tick: u64) -> bool {
        self.every_ticks > 0 && tick.checked_rem(self.every_ticks) == Some(0)
    }
}

impl TickCallback for StatsCallback {
    fn on_tick(&mut self, report: &TickReport, adapter: &ReconciliationAdapter) {
        let repairs = u64::try_from(report.repairs).unwrap_or(u64::MAX);
        self.repairs_total = self.repairs_total.saturating_add(repairs);

        if !self.due(report.tick) {
            return;
        }
        let stats = adapter.manager().get_stats();
        info!(
            tick = report.tick,
            now_ms = report.now_ms,
            pets = report.pets,
            items = report.items,
            balance = %stats.balance,
            pending = adapter.pending().len(),
            repairs = self.repairs_total,
            "stats"
        );
        for pet in &stats.pets {
            debug!(
                agent = %pet.id,
                activity = ?pet.activity,
                hunger = ?pet.hunger_band,
                cleanliness = ?pet.cleanliness_band,
                happiness = ?pet.happiness_band,
                "pet"
            );
        }
        self.last = Some(stats);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use petsim_core::{PetManager, SimulationConfig};

    use super::*;

    fn report(tick: u64, repairs: usize) -> TickReport {
        TickReport {
            tick,
            now_ms: tick.saturating_mul(16),
            pets: 1,
            items: 0,
            timers_fired: 0,
            repairs,
        }
    }

    #[test]
    fn captures_stats_on_cadence() {
        let mut adapter =
            ReconciliationAdapter::new(PetManager::with_local_ledger(SimulationConfig::default()));
        adapter.manager_mut().create_agent(None, 100.0).unwrap();
        let mut callback = StatsCallback::new(10);

        callback.on_tick(&report(9, 0), &adapter);
        assert!(callback.last_stats().is_none());
        callback.on_tick(&report(10, 0), &adapter);
        assert_eq!(callback.last_stats().unwrap().pets.len(), 1);
    }

    #[test]
    fn zero_cadence_never_logs_but_counts_repairs() {
        let adapter =
            ReconciliationAdapter::new(PetManager::with_local_ledger(SimulationConfig::default()));
        let mut callback = StatsCallback::new(0);
        callback.on_tick(&report(1, 2), &adapter);
        callback.on_tick(&report(2, 1), &adapter);
        assert!(callback.last_stats().is_none());
        assert_eq!(callback.repairs_total(), 3);
    }
}
