// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Local alerts - speaker tones and haptic pulses

use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::detection::StatusLevel;

/// Actuator faults
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AlertError {
    #[error("speaker unavailable: {0}")]
    Speaker(String),

    #[error("haptic motor unavailable: {0}")]
    Haptic(String),
}

/// A single tone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tone {
    pub frequency_hz: u32,
    pub duration: Duration,
}

impl Tone {
    pub const fn new(frequency_hz: u32, duration_ms: u64) -> Self {
        Self {
            frequency_hz,
            duration: Duration::from_millis(duration_ms),
        }
    }
}

/// Button acknowledgement tones
pub mod chirps {
    use super::Tone;

    pub const RESUME: Tone = Tone::new(1000, 100);
    pub const PAUSE: Tone = Tone::new(500, 100);
    pub const REFRESH: Tone = Tone::new(1500, 50);
}

/// Speaker and vibration motor
pub trait AlertOutput: Send {
    /// Start a tone. Returns once the tone has been queued, not once it ends.
    fn tone(&mut self, tone: Tone) -> Result<(), AlertError>;

    fn set_haptic(&mut self, enabled: bool) -> Result<(), AlertError>;
}

/// Tone and haptic timings for each alarm level
#[derive(Debug, Clone, PartialEq)]
pub struct AlertProfile {
    pub critical_tone: Tone,
    pub critical_repeats: u32,
    pub critical_gap: Duration,
    pub haptic_pulse: Duration,
    pub warning_tone: Tone,
}

impl Default for AlertProfile {
    fn default() -> Self {
        Self {
            critical_tone: Tone::new(2000, 100),
            critical_repeats: 3,
            critical_gap: Duration::from_millis(150),
            haptic_pulse: Duration::from_millis(500),
            warning_tone: Tone::new(1500, 200),
        }
    }
}

/// Maps a status level to a local alert
pub struct AlertDispatcher {
    output: Box<dyn AlertOutput>,
    profile: AlertProfile,
    muted: bool,
}

impl AlertDispatcher {
    pub fn new(output: Box<dyn AlertOutput>, profile: AlertProfile) -> Self {
        Self {
            output,
            profile,
            muted: false,
        }
    }

    pub fn muted(mut self, muted: bool) -> Self {
        self.muted = muted;
        self
    }

    /// Play the alert for `level`. Actuator faults are logged and dropped.
    pub async fn dispatch(&mut self, level: StatusLevel) {
        if self.muted {
            if level.is_alarm() {
                debug!("Alert {} suppressed (muted)", level);
            }
            return;
        }

        match level {
            StatusLevel::Critical => {
                for _ in 0..self.profile.critical_repeats {
                    self.play(self.profile.critical_tone);
                    tokio::time::sleep(self.profile.critical_gap).await;
                }
                self.pulse_haptic().await;
            }
            StatusLevel::Warning => {
                self.play(self.profile.warning_tone);
            }
            StatusLevel::Running => {}
        }
    }

    /// Single acknowledgement tone
    pub fn chirp(&mut self, tone: Tone) {
        if !self.muted {
            self.play(tone);
        }
    }

    fn play(&mut self, tone: Tone) {
        if let Err(e) = self.output.tone(tone) {
            warn!("Tone {} Hz failed: {}", tone.frequency_hz, e);
        }
    }

    async fn pulse_haptic(&mut self) {
        if let Err(e) = self.output.set_haptic(true) {
            debug!("Haptic unavailable: {}", e);
            return;
        }
        tokio::time::sleep(self.profile.haptic_pulse).await;
        if let Err(e) = self.output.set_haptic(false) {
            debug!("Haptic stop failed: {}", e);
        }
    }
}

/// Host stand-in for the speaker and motor: alerts go to the log
#[derive(Debug, Default)]
pub struct LogAlertOutput;

impl AlertOutput for LogAlertOutput {
    fn tone(&mut self, tone: Tone) -> Result<(), AlertError> {
        info!("🔔 {} Hz for {:?}", tone.frequency_hz, tone.duration);
        Ok(())
    }

    fn set_haptic(&mut self, enabled: bool) -> Result<(), AlertError> {
        debug!("Haptic {}", if enabled { "on" } else { "off" });
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Actuation {
        Tone(Tone),
        Haptic(bool),
    }

    /// Records every actuation; can be told to fail the haptic motor
    #[derive(Clone, Default)]
    pub struct RecordingOutput {
        pub log: Arc<Mutex<Vec<Actuation>>>,
        pub haptic_broken: bool,
    }

    impl RecordingOutput {
        pub fn tones(&self) -> Vec<Tone> {
            self.log
                .lock()
                .iter()
                .filter_map(|a| match a {
                    Actuation::Tone(t) => Some(*t),
                    _ => None,
                })
                .collect()
        }
    }

    impl AlertOutput for RecordingOutput {
        fn tone(&mut self, tone: Tone) -> Result<(), AlertError> {
            self.log.lock().push(Actuation::Tone(tone));
            Ok(())
        }

        fn set_haptic(&mut self, enabled: bool) -> Result<(), AlertError> {
            if self.haptic_broken {
                return Err(AlertError::Haptic("no motor fitted".into()));
            }
            self.log.lock().push(Actuation::Haptic(enabled));
            Ok(())
        }
    }
}
