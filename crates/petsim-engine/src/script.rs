//! Scripted host input.
//!
//! Stands in for the UI layer: sends a timed sequence of commands and
//! authority events into the runner, waits a while so the pets can act on
//! them, then drops its sender. The run ends once every input sender is
//! gone.

use std::path::Path;

use petsim_core::RunnerInput;
use petsim_types::{Activity, Command, EntityFields, EntityKind, InboundEvent, ResourceKind};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::time::{Duration, sleep};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::EngineError;

/// Id of the pet the built-in script introduces through the authority path.
const SCRIPTED_PET: Uuid = Uuid::from_u128(0x0196_0000_0000_7000_8000_0000_0000_0001);

/// One scripted input.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum ScriptAction {
    /// A command from the UI layer.
    Command(Command),
    /// An event from the remote authority.
    Inbound(InboundEvent),
}

impl From<ScriptAction> for RunnerInput {
    fn from(action: ScriptAction) -> Self {
        match action {
            ScriptAction::Command(command) => Self::Command(command),
            ScriptAction::Inbound(event) => Self::Inbound(event),
        }
    }
}

/// An action and the delay before it is sent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScriptStep {
    /// Wall-clock delay after the previous step.
    #[serde(default)]
    pub after_ms: u64,
    /// What to send.
    pub action: ScriptAction,
}

/// The host script, read from the `script` section of the config file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HostScript {
    /// Steps in send order. Empty means use the built-in demo.
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
    /// How long to keep the input open after the last step.
    #[serde(default = "default_linger_ms")]
    pub linger_ms: u64,
}

impl Default for HostScript {
    fn default() -> Self {
        Self {
            steps: demo_steps(),
            linger_ms: default_linger_ms(),
        }
    }
}

const fn default_linger_ms() -> u64 {
    20_000
}

fn step(after_ms: u64, action: ScriptAction) -> ScriptStep {
    ScriptStep { after_ms, action }
}

/// Two local pets, one authority-created hungry pet, a food drop it
/// contends for, a toy, a cleanup attempt, and a forced reset.
fn demo_steps() -> Vec<ScriptStep> {
    vec![
        step(0, ScriptAction::Command(Command::CreateAgent { id: None, x: 150.0 })),
        step(100, ScriptAction::Command(Command::CreateAgent { id: None, x: 650.0 })),
        step(
            200,
            ScriptAction::Inbound(InboundEvent::EntityUpserted {
                kind: EntityKind::Pet,
                id: SCRIPTED_PET,
                fields: EntityFields {
                    x: Some(400.0),
                    hunger: Some(40.0),
                    happiness: Some(50.0),
                    ..EntityFields::default()
                },
            }),
        ),
        step(
            500,
            ScriptAction::Command(Command::PurchaseAndDrop {
                kind: ResourceKind::Food,
                x: 520.0,
            }),
        ),
        step(1_000, ScriptAction::Command(Command::UseToy { x: 300.0, y: 0.0 })),
        step(
            2_000,
            ScriptAction::Command(Command::DirectActivity {
                agent: None,
                activity: Activity::Sleeping,
            }),
        ),
        step(3_000, ScriptAction::Command(Command::UseCleanupTool { x: 400.0, y: 0.0 })),
        step(2_000, ScriptAction::Command(Command::ForceResetAll)),
    ]
}

/// Parse the `script` section out of a full config document. A missing
/// section or an empty step list yields the built-in demo.
///
/// # Errors
///
/// Returns [`EngineError::Script`] if the document or the section is not
/// valid YAML for a [`HostScript`].
pub fn script_from_yaml(contents: &str) -> Result<HostScript, EngineError> {
    let raw: serde_yml::Value = serde_yml::from_str(contents).map_err(|e| EngineError::Script {
        message: format!("failed to parse config YAML: {e}"),
    })?;
    let Some(section) = raw.get("script") else {
        return Ok(HostScript::default());
    };
    let mut script: HostScript =
        serde_yml::from_value(section.clone()).map_err(|e| EngineError::Script {
            message: format!("failed to parse script section: {e}"),
        })?;
    if script.steps.is_empty() {
        script.steps = demo_steps();
    }
    Ok(script)
}

/// Load the host script from the config file, or the built-in demo if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`EngineError::Script`] if the file exists but cannot be read or
/// parsed.
pub fn load_script(path: &Path) -> Result<HostScript, EngineError> {
    if !path.exists() {
        return Ok(HostScript::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| EngineError::Script {
        message: format!("failed to read config file: {e}"),
    })?;
    script_from_yaml(&contents)
}

/// Send every step, linger, then drop the sender. Returns how many steps
/// were delivered.
pub async fn run_script(script: HostScript, input: mpsc::Sender<RunnerInput>) -> usize {
    let total = script.steps.len();
    let mut sent: usize = 0;
    for step in script.steps {
        if step.after_ms > 0 {
            sleep(Duration::from_millis(step.after_ms)).await;
        }
        debug!(action = ?step.action, "script step");
        if input.send(step.action.into()).await.is_err() {
            warn!(sent, total, "runner stopped before the script finished");
            return sent;
        }
        sent = sent.saturating_add(1);
    }
    info!(sent, linger_ms = script.linger_ms, "script finished, lingering");
    sleep(Duration::from_millis(script.linger_ms)).await;
    sent
}
