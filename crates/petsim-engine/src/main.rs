//! Headless host binary for the pet simulation.
//!
//! Wires the simulation core to a scripted host and an in-process
//! authority: it loads configuration, builds the manager and the
//! reconciliation adapter, and runs the fixed-rate tick loop until the
//! script closes its input, the tick limit is reached, or Ctrl-C is
//! pressed.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `petsim-config.yaml` (or `PETSIM_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Create the wallet ledger, pet manager, and reconciliation adapter
//! 4. Create run control from world bounds
//! 5. Open the input, intent, and notification channels
//! 6. Spawn the loopback authority, notification logger, and host script
//! 7. Run the simulation loop
//! 8. Log the result

mod authority;
mod error;
mod script;
mod stats_callback;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use petsim_core::{
    PetManager, ReconciliationAdapter, RunControl, RunnerChannels, SimulationConfig, log_run_end,
    run_simulation,
};
use petsim_ledger::LocalLedger;
use petsim_types::Notification;
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::authority::LoopbackAuthority;
use crate::error::EngineError;
use crate::stats_callback::StatsCallback;

/// Default config file, relative to the working directory.
const CONFIG_FILE: &str = "petsim-config.yaml";

/// Buffered inputs between host and runner.
const INPUT_CAPACITY: usize = 256;

/// Buffered intents between runner and authority.
const INTENT_CAPACITY: usize = 256;

/// Buffered notifications per subscriber.
const NOTIFICATION_CAPACITY: usize = 128;

/// Ticks between stats lines.
const STATS_EVERY_TICKS: u64 = 300;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration loading or the simulation run fails.
#[tokio::main]
#[allow(clippy::too_many_lines)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config_path = config_path();
    let config = load_config(&config_path)?;

    // 2. Initialize structured logging. RUST_LOG wins over the config level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(path = %config_path.display(), "petsim-engine starting");
    info!(
        seed = config.world.seed,
        tick_interval_ms = config.world.tick_interval_ms,
        arena_width = config.world.arena_width,
        policy = ?config.reconciliation.policy,
        "Configuration loaded"
    );

    let script = script::load_script(&config_path)?;
    info!(
        steps = script.steps.len(),
        linger_ms = script.linger_ms,
        "Host script loaded"
    );

    // 3. Ledger, manager, adapter.
    let starting_balance = config.economy.starting_balance;
    let ledger = LocalLedger::new(starting_balance);
    let run_control = Arc::new(RunControl::new(
        config.world.tick_interval_ms,
        config.world.max_ticks,
    ));
    let manager = PetManager::new(config, Box::new(ledger));
    let mut adapter = ReconciliationAdapter::new(manager);
    info!(balance = %starting_balance, "Pet manager initialized");

    // 4. Run control.
    info!(
        max_ticks = run_control.max_ticks(),
        tick_interval_ms = run_control.tick_interval_ms(),
        "Run control initialized"
    );
    spawn_ctrl_c(Arc::clone(&run_control));

    // 5. Channels.
    let (input_tx, input_rx) = mpsc::channel(INPUT_CAPACITY);
    let (intent_tx, intent_rx) = mpsc::channel(INTENT_CAPACITY);
    let (notification_tx, notification_rx) = broadcast::channel(NOTIFICATION_CAPACITY);
    let mut channels = RunnerChannels {
        input: input_rx,
        intents: intent_tx,
        notifications: notification_tx,
    };

    // 6. Background tasks.
    let authority_task = tokio::spawn(authority::run_authority(
        LoopbackAuthority::new(starting_balance),
        intent_rx,
        input_tx.downgrade(),
    ));
    let notification_task = tokio::spawn(log_notifications(notification_rx));
    let script_task = tokio::spawn(script::run_script(script, input_tx));

    // 7. Run the simulation.
    let mut callback = StatsCallback::new(STATS_EVERY_TICKS);
    let summary = run_simulation(&mut adapter, &run_control, &mut channels, &mut callback).await?;

    // 8. Log results.
    log_run_end(&summary);
    drop(channels);
    script_task.abort();

    let authority_stats = authority_task.await.map_err(|e| EngineError::Task {
        message: format!("authority task failed: {e}"),
    })?;
    let notifications = notification_task.await.map_err(|e| EngineError::Task {
        message: format!("notification task failed: {e}"),
    })?;

    let stats = adapter.manager().get_stats();
    for pet in &stats.pets {
        info!(
            agent = %pet.id,
            activity = ?pet.activity,
            hunger = pet.needs.hunger,
            cleanliness = pet.needs.cleanliness,
            happiness = pet.needs.happiness,
            "final pet state"
        );
    }
    info!(
        end_reason = ?summary.end_reason,
        total_ticks = summary.total_ticks,
        balance = %stats.balance,
        repairs = callback.repairs_total(),
        notifications,
        authority_confirmed = authority_stats.confirmed,
        authority_rejected = authority_stats.rejected,
        "petsim-engine shutdown complete"
    );

    Ok(())
}

/// Config file path: `PETSIM_CONFIG` if set, else [`CONFIG_FILE`].
fn config_path() -> PathBuf {
    std::env::var_os("PETSIM_CONFIG").map_or_else(|| PathBuf::from(CONFIG_FILE), PathBuf::from)
}

/// Load the simulation configuration, falling back to defaults when the
/// file does not exist.
fn load_config(path: &Path) -> Result<SimulationConfig, EngineError> {
    if path.exists() {
        Ok(SimulationConfig::from_file(path)?)
    } else {
        let mut config = SimulationConfig::default();
        config.apply_env_overrides();
        Ok(config)
    }
}

/// Request a stop on Ctrl-C.
fn spawn_ctrl_c(control: Arc<RunControl>) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, stopping");
                control.request_stop();
            }
            Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
        }
    });
}

/// Log every notification until the runner drops its sender. Returns how
/// many were seen.
async fn log_notifications(mut rx: broadcast::Receiver<Notification>) -> u64 {
    let mut seen: u64 = 0;
    loop {
        match rx.recv().await {
            Ok(notification) => {
                seen = seen.saturating_add(1);
                info!(notification = ?notification, "notification");
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "notification logger lagged");
                seen = seen.saturating_add(skipped);
            }
            Err(broadcast::error::RecvError::Closed) => return seen,
        }
    }
}
