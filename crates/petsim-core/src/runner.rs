//! Fixed-rate tick loop with host controls.
//!
//! [`run_simulation`] drives a [`ReconciliationAdapter`] on a tokio task:
//!
//! - **Between ticks**: every queued [`RunnerInput`] (inbound authority
//!   events and host commands) is applied in arrival order.
//! - **Tick**: simulated time advances by the measured wall-clock delta
//!   since the previous tick, so decay is independent of the tick rate.
//! - **After the tick**: outbound intents go to the intent channel and
//!   notifications to the broadcast channel.
//! - **Bounds**: the loop ends at `max_ticks`, on a stop request, or when
//!   every input sender has been dropped.

use std::sync::Arc;

use petsim_types::{Command, InboundEvent, Intent, Notification};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::control::{RunControl, RunEndReason};
use crate::manager::{TickError, TickReport};
use crate::reconcile::ReconciliationAdapter;

/// Errors that can occur during a run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Something for the loop to apply between ticks.
#[derive(Debug, Clone, PartialEq)]
pub enum RunnerInput {
    /// An event from the remote authority.
    Inbound(InboundEvent),
    /// A command from the UI or CLI layer.
    Command(Command),
}

/// The channels a run talks through.
#[derive(Debug)]
pub struct RunnerChannels {
    /// Inbound events and commands.
    pub input: mpsc::Receiver<RunnerInput>,
    /// Outbound intents for the authority.
    pub intents: mpsc::Sender<Intent>,
    /// Transient notifications for the host UI.
    pub notifications: broadcast::Sender<Notification>,
}

/// Result of a run.
#[derive(Debug)]
pub struct RunSummary {
    /// Why the run ended.
    pub end_reason: RunEndReason,
    /// The last tick report, if any tick completed.
    pub final_report: Option<TickReport>,
    /// Ticks executed.
    pub total_ticks: u64,
    /// Inputs applied successfully.
    pub inputs_applied: u64,
    /// Inputs that failed.
    pub inputs_failed: u64,
}

/// Callback invoked after each tick.
pub trait TickCallback: Send {
    /// Called after a tick completes.
    fn on_tick(&mut self, report: &TickReport, adapter: &ReconciliationAdapter);
}

/// A callback that does nothing.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _report: &TickReport, _adapter: &ReconciliationAdapter) {}
}

#[derive(Debug, Default)]
struct InputCounts {
    applied: u64,
    failed: u64,
}

/// Run the loop until a bound is reached.
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick fails.
pub async fn run_simulation(
    adapter: &mut ReconciliationAdapter,
    control: &Arc<RunControl>,
    channels: &mut RunnerChannels,
    callback: &mut dyn TickCallback,
) -> Result<RunSummary, RunnerError> {
    let mut last_report: Option<TickReport> = None;
    let mut total_ticks: u64 = 0;
    let mut counts = InputCounts::default();
    let mut last_tick = Instant::now();

    info!(
        max_ticks = control.max_ticks(),
        tick_interval_ms = control.tick_interval_ms(),
        policy = ?adapter.policy(),
        "simulation starting"
    );

    loop {
        if control.is_paused() {
            info!("simulation paused");
            control.wait_if_paused().await;
            info!("simulation resumed");
            last_tick = Instant::now();
        }

        if control.is_stop_requested() {
            info!("stop requested");
            return Ok(finish(
                control,
                RunEndReason::StopRequested,
                last_report,
                total_ticks,
                counts,
            )
            .await);
        }

        let closed = drain_inputs(adapter, &mut channels.input, &mut counts);
        if closed {
            forward(adapter, channels).await;
            info!("input channel closed");
            return Ok(finish(
                control,
                RunEndReason::InputClosed,
                last_report,
                total_ticks,
                counts,
            )
            .await);
        }

        let now = Instant::now();
        let delta_ms = u64::try_from(now.duration_since(last_tick).as_millis()).unwrap_or(u64::MAX);
        last_tick = now;

        let report = adapter.tick(delta_ms)?;
        total_ticks = total_ticks.saturating_add(1);
        forward(adapter, channels).await;
        callback.on_tick(&report, adapter);

        if control.tick_limit_reached(report.tick) {
            info!(tick = report.tick, max_ticks = control.max_ticks(), "tick limit reached");
            return Ok(finish(
                control,
                RunEndReason::MaxTicksReached,
                Some(report),
                total_ticks,
                counts,
            )
            .await);
        }
        last_report = Some(report);

        let interval_ms = control.tick_interval_ms();
        if interval_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(interval_ms)).await;
        }
    }
}

/// Apply every queued input. Returns `true` once every sender is gone.
fn drain_inputs(
    adapter: &mut ReconciliationAdapter,
    input: &mut mpsc::Receiver<RunnerInput>,
    counts: &mut InputCounts,
) -> bool {
    loop {
        let next = match input.try_recv() {
            Ok(next) => next,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Disconnected) => return true,
        };
        let applied = match next {
            RunnerInput::Inbound(event) => match adapter.apply(event) {
                Ok(outcome) => {
                    debug!(outcome = ?outcome, "inbound event applied");
                    true
                }
                Err(e) => {
                    warn!(error = %e, "inbound event rejected");
                    false
                }
            },
            RunnerInput::Command(command) => match adapter.execute(command) {
                Ok(outcome) => {
                    debug!(outcome = ?outcome, "command executed");
                    true
                }
                Err(e) => {
                    info!(error = %e, "command failed");
                    false
                }
            },
        };
        if applied {
            counts.applied = counts.applied.saturating_add(1);
        } else {
            counts.failed = counts.failed.saturating_add(1);
        }
    }
}

/// Send queued intents and notifications out.
async fn forward(adapter: &mut ReconciliationAdapter, channels: &RunnerChannels) {
    for intent in adapter.drain_intents() {
        if channels.intents.send(intent).await.is_err() {
            debug!("intent receiver dropped");
        }
    }
    for notification in adapter.drain_notifications() {
        // No subscribers is not an error.
        let _ = channels.notifications.send(notification);
    }
}

async fn finish(
    control: &RunControl,
    end_reason: RunEndReason,
    final_report: Option<TickReport>,
    total_ticks: u64,
    counts: InputCounts,
) -> RunSummary {
    control.set_end_reason(end_reason).await;
    RunSummary {
        end_reason,
        final_report,
        total_ticks,
        inputs_applied: counts.applied,
        inputs_failed: counts.failed,
    }
}

/// Log how a run ended.
pub fn log_run_end(summary: &RunSummary) {
    info!(
        reason = ?summary.end_reason,
        total_ticks = summary.total_ticks,
        inputs_applied = summary.inputs_applied,
        inputs_failed = summary.inputs_failed,
        "simulation ended"
    );

    if let Some(ref report) = summary.final_report {
        info!(
            tick = report.tick,
            now_ms = report.now_ms,
            pets = report.pets,
            items = report.items,
            "final tick report"
        );
    } else {
        warn!("simulation ended with no ticks executed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use petsim_types::ResourceKind;
    use uuid::Uuid;

    use super::*;
    use crate::config::SimulationConfig;
    use crate::manager::PetManager;

    fn adapter() -> ReconciliationAdapter {
        ReconciliationAdapter::new(PetManager::with_local_ledger(SimulationConfig::default()))
    }

    fn channels() -> (
        mpsc::Sender<RunnerInput>,
        RunnerChannels,
        mpsc::Receiver<Intent>,
    ) {
        let (input_tx, input) = mpsc::channel(64);
        let (intents, intent_rx) = mpsc::channel(64);
        let (notifications, _) = broadcast::channel(64);
        (
            input_tx,
            RunnerChannels {
                input,
                intents,
                notifications,
            },
            intent_rx,
        )
    }

    #[tokio::test]
    async fn bounded_by_max_ticks() {
        let mut adapter = adapter();
        let (_input, mut channels, _intents) = channels();
        let control = Arc::new(RunControl::new(0, 5));

        let summary = run_simulation(&mut adapter, &control, &mut channels, &mut NoOpCallback)
            .await
            .unwrap();

        assert_eq!(summary.end_reason, RunEndReason::MaxTicksReached);
        assert_eq!(summary.total_ticks, 5);
        assert_eq!(control.end_reason().await, Some(RunEndReason::MaxTicksReached));
    }

    #[tokio::test]
    async fn stop_before_first_tick() {
        let mut adapter = adapter();
        let (_input, mut channels, _intents) = channels();
        let control = Arc::new(RunControl::new(0, 0));
        control.request_stop();

        let summary = run_simulation(&mut adapter, &control, &mut channels, &mut NoOpCallback)
            .await
            .unwrap();

        assert_eq!(summary.end_reason, RunEndReason::StopRequested);
        assert_eq!(summary.total_ticks, 0);
        assert!(summary.final_report.is_none());
    }

    #[tokio::test]
    async fn closed_input_ends_run() {
        let mut adapter = adapter();
        let (input, mut channels, _intents) = channels();
        input
            .send(RunnerInput::Command(Command::CreateAgent { id: None, x: 200.0 }))
            .await
            .unwrap();
        drop(input);
        let control = Arc::new(RunControl::new(0, 0));

        let summary = run_simulation(&mut adapter, &control, &mut channels, &mut NoOpCallback)
            .await
            .unwrap();

        assert_eq!(summary.end_reason, RunEndReason::InputClosed);
        assert_eq!(summary.inputs_applied, 1);
        assert_eq!(adapter.manager().pet_count(), 1);
    }

    #[tokio::test]
    async fn inputs_apply_and_intents_flow_out() {
        let mut adapter = adapter();
        let (input, mut channels, mut intents) = channels();
        let mut notes = channels.notifications.subscribe();
        let pet = Uuid::new_v4();
        input
            .send(RunnerInput::Inbound(InboundEvent::EntityUpserted {
                kind: petsim_types::EntityKind::Pet,
                id: pet,
                fields: petsim_types::EntityFields {
                    x: Some(100.0),
                    ..petsim_types::EntityFields::default()
                },
            }))
            .await
            .unwrap();
        input
            .send(RunnerInput::Command(Command::PurchaseAndDrop {
                kind: ResourceKind::Waste,
                x: 100.0,
            }))
            .await
            .unwrap();
        input
            .send(RunnerInput::Command(Command::PurchaseAndDrop {
                kind: ResourceKind::Food,
                x: 400.0,
            }))
            .await
            .unwrap();
        let control = Arc::new(RunControl::new(0, 1));

        let summary = run_simulation(&mut adapter, &control, &mut channels, &mut NoOpCallback)
            .await
            .unwrap();

        assert_eq!(summary.inputs_applied, 2);
        assert_eq!(summary.inputs_failed, 1);
        assert!(matches!(intents.try_recv(), Ok(Intent::Purchase { .. })));
        assert!(matches!(intents.try_recv(), Ok(Intent::ItemDropped { .. })));
        assert!(matches!(
            notes.try_recv(),
            Ok(Notification::AgentCreated { .. })
        ));
    }

    #[tokio::test]
    async fn tick_callback_is_called() {
        struct CountCallback {
            count: u64,
        }
        impl TickCallback for CountCallback {
            fn on_tick(&mut self, _report: &TickReport, _adapter: &ReconciliationAdapter) {
                self.count = self.count.saturating_add(1);
            }
        }

        let mut adapter = adapter();
        let (_input, mut channels, _intents) = channels();
        let control = Arc::new(RunControl::new(0, 3));
        let mut callback = CountCallback { count: 0 };

        let _ = run_simulation(&mut adapter, &control, &mut channels, &mut callback)
            .await
            .unwrap();

        assert_eq!(callback.count, 3);
    }

    #[tokio::test]
    async fn paused_run_waits_for_resume() {
        let mut adapter = adapter();
        let (_input, mut channels, _intents) = channels();
        let control = Arc::new(RunControl::new(0, 2));
        control.pause();

        let resumer = Arc::clone(&control);
        tokio::spawn(async move {
            tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
            resumer.resume();
        });

        let summary = run_simulation(&mut adapter, &control, &mut channels, &mut NoOpCallback)
            .await
            .unwrap();
        assert_eq!(summary.total_ticks, 2);
    }
}
