// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Remote commands and local button input

use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::alerts::AlertDispatcher;
use crate::core::RunState;
use crate::detection::StatusLevel;

/// Anything delivered into the engine from outside the loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeInput {
    /// Raw payload from the commands topic
    Remote(Vec<u8>),
    /// Front-panel button press
    Button(Button),
}

/// Front-panel buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Toggle publishing
    A,
    /// Refresh and publish now
    B,
    /// Alert test
    C,
}

/// Command parse failures
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("malformed command payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unknown command {0:?}")]
    Unknown(String),
}

/// Recognized remote commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Pause,
    Resume,
    Alert,
    Reboot,
}

#[derive(Deserialize)]
struct CommandEnvelope {
    #[serde(default)]
    command: String,
}

impl Command {
    /// Parse a `{"command": "..."}` payload
    pub fn parse(raw: &[u8]) -> Result<Self, CommandError> {
        let envelope: CommandEnvelope = serde_json::from_slice(raw)?;
        match envelope.command.as_str() {
            "pause" => Ok(Command::Pause),
            "resume" => Ok(Command::Resume),
            "alert" => Ok(Command::Alert),
            "reboot" => Ok(Command::Reboot),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// Process-level control the node can request
pub trait SystemControl: Send + Sync {
    /// Ask for the node to be restarted. The current run ends at the end of
    /// the tick in which this was called.
    fn request_restart(&self);

    fn restart_requested(&self) -> bool;
}

/// Restart request flag checked by the engine once per tick
#[derive(Debug, Clone, Default)]
pub struct RestartSignal {
    requested: Arc<AtomicBool>,
}

impl RestartSignal {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SystemControl for RestartSignal {
    fn request_restart(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    fn restart_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// Applies remote commands to the run state
pub struct CommandHandler<'a> {
    alerts: &'a mut AlertDispatcher,
    system: &'a dyn SystemControl,
}

impl<'a> CommandHandler<'a> {
    pub fn new(alerts: &'a mut AlertDispatcher, system: &'a dyn SystemControl) -> Self {
        Self { alerts, system }
    }

    /// Apply one raw payload. Malformed or unknown payloads leave the state
    /// untouched.
    pub async fn handle(&mut self, raw: &[u8], state: RunState) -> RunState {
        let command = match Command::parse(raw) {
            Ok(command) => command,
            Err(e) => {
                warn!("Command parse error: {}", e);
                return state;
            }
        };

        info!("Command received: {:?}", command);
        match command {
            Command::Pause => RunState {
                auto_publish: false,
                ..state
            },
            Command::Resume => RunState {
                auto_publish: true,
                ..state
            },
            Command::Alert => {
                self.alerts.dispatch(StatusLevel::Warning).await;
                state
            }
            Command::Reboot => {
                self.system.request_restart();
                state
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::testing::RecordingOutput;
    use crate::alerts::{AlertProfile, Tone};

    fn state() -> RunState {
        RunState {
            auto_publish: true,
            last_publish_ts: 777,
        }
    }

    #[test]
    fn test_parse_known_commands() {
        assert_eq!(Command::parse(br#"{"command":"pause"}"#).unwrap(), Command::Pause);
        assert_eq!(Command::parse(br#"{"command":"resume"}"#).unwrap(), Command::Resume);
        assert_eq!(Command::parse(br#"{"command":"alert"}"#).unwrap(), Command::Alert);
        assert_eq!(
            Command::parse(br#"{"command":"reboot","reason":"ops"}"#).unwrap(),
            Command::Reboot
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(Command::parse(b"not json"), Err(CommandError::Malformed(_))));
        assert!(matches!(Command::parse(b"{}"), Err(CommandError::Unknown(_))));
        assert!(matches!(
            Command::parse(br#"{"command":"selfdestruct"}"#),
            Err(CommandError::Unknown(_))
        ));
    }

    #[tokio::test]
    async fn test_pause_and_resume() {
        let output = RecordingOutput::default();
        let mut alerts = AlertDispatcher::new(Box::new(output), AlertProfile::default());
        let system = RestartSignal::new();
        let mut handler = CommandHandler::new(&mut alerts, &system);

        let paused = handler.handle(br#"{"command":"pause"}"#, state()).await;
        assert!(!paused.auto_publish);
        assert_eq!(paused.last_publish_ts, 777);

        let resumed = handler.handle(br#"{"command":"resume"}"#, paused).await;
        assert!(resumed.auto_publish);
    }

    #[tokio::test]
    async fn test_garbage_leaves_state_unchanged() {
        let output = RecordingOutput::default();
        let mut alerts = AlertDispatcher::new(Box::new(output.clone()), AlertProfile::default());
        let system = RestartSignal::new();
        let mut handler = CommandHandler::new(&mut alerts, &system);

        assert_eq!(handler.handle(b"not json", state()).await, state());
        assert_eq!(handler.handle(br#"{"command":42}"#, state()).await, state());
        assert!(output.log.lock().is_empty());
        assert!(!system.restart_requested());
    }

    #[tokio::test]
    async fn test_alert_plays_warning_profile() {
        let output = RecordingOutput::default();
        let mut alerts = AlertDispatcher::new(Box::new(output.clone()), AlertProfile::default());
        let system = RestartSignal::new();
        let mut handler = CommandHandler::new(&mut alerts, &system);

        let after = handler.handle(br#"{"command":"alert"}"#, state()).await;
        assert_eq!(after, state());
        assert_eq!(output.tones(), vec![Tone::new(1500, 200)]);
    }

    #[tokio::test]
    async fn test_reboot_requests_restart() {
        let output = RecordingOutput::default();
        let mut alerts = AlertDispatcher::new(Box::new(output), AlertProfile::default());
        let system = RestartSignal::new();
        let mut handler = CommandHandler::new(&mut alerts, &system);

        handler.handle(br#"{"command":"reboot"}"#, state()).await;
        assert!(system.restart_requested());
    }
}
