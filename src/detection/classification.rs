// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Threshold classification

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ThresholdConfig;
use crate::sensors::Reading;

/// Overall node status, derived from all three channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusLevel {
    Running,
    Warning,
    Critical,
}

impl StatusLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusLevel::Running => "RUNNING",
            StatusLevel::Warning => "WARNING",
            StatusLevel::Critical => "CRITICAL",
        }
    }

    /// Whether this level calls for a local alert
    pub fn is_alarm(&self) -> bool {
        *self != StatusLevel::Running
    }
}

impl fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Proximity status, derived from distance alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProximityLevel {
    Safe,
    Warning,
    Danger,
}

impl ProximityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProximityLevel::Safe => "SAFE",
            ProximityLevel::Warning => "WARNING",
            ProximityLevel::Danger => "DANGER",
        }
    }
}

impl fmt::Display for ProximityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a reading into `(status, proximity)`.
///
/// Temperature and vibration escalate at `>=` their thresholds; distance
/// escalates at `<=` because closer is worse.
pub fn classify(reading: &Reading, config: &ThresholdConfig) -> (StatusLevel, ProximityLevel) {
    let Reading { temperature, vibration, distance, .. } = *reading;

    let status = if temperature >= config.temp_crit
        || vibration >= config.vib_crit
        || distance <= config.dist_danger
    {
        StatusLevel::Critical
    } else if temperature >= config.temp_warn
        || vibration >= config.vib_warn
        || distance <= config.dist_warn
    {
        StatusLevel::Warning
    } else {
        StatusLevel::Running
    };

    (status, classify_proximity(distance, config))
}

pub fn classify_proximity(distance: f64, config: &ThresholdConfig) -> ProximityLevel {
    if distance <= config.dist_danger {
        ProximityLevel::Danger
    } else if distance <= config.dist_warn {
        ProximityLevel::Warning
    } else {
        ProximityLevel::Safe
    }
}

/// Level of a single rising channel (temperature or vibration)
pub fn channel_level(value: f64, warn: f64, crit: f64) -> StatusLevel {
    if value >= crit {
        StatusLevel::Critical
    } else if value >= warn {
        StatusLevel::Warning
    } else {
        StatusLevel::Running
    }
}

/// Coarse battery indication for the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatteryBand {
    Low,
    Medium,
    Normal,
}

impl BatteryBand {
    pub fn from_percent(percent: u8) -> Self {
        if percent < 20 {
            BatteryBand::Low
        } else if percent < 50 {
            BatteryBand::Medium
        } else {
            BatteryBand::Normal
        }
    }
}
