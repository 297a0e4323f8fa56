// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Wire payloads for the telemetry and events topics

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::detection::{ProximityLevel, StatusLevel};
use crate::sensors::Reading;

/// Round half away from zero to `places` decimals
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Periodic sensor snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryPayload {
    pub device_id: String,
    pub temp: f64,
    pub vib: f64,
    pub distance: f64,
    pub proximity: ProximityLevel,
    pub status: StatusLevel,
    pub battery: u8,
    pub ts: i64,
}

impl TelemetryPayload {
    pub fn new(
        device_id: &str,
        reading: &Reading,
        status: StatusLevel,
        proximity: ProximityLevel,
        ts: i64,
    ) -> Self {
        Self {
            device_id: device_id.to_string(),
            temp: round_to(reading.temperature, 2),
            vib: round_to(reading.vibration, 3),
            distance: round_to(reading.distance, 1),
            proximity,
            status,
            battery: reading.battery,
            ts,
        }
    }
}

/// Event severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
        })
    }
}

/// Readings attached to an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDetails {
    pub temp: f64,
    pub vib: f64,
    pub distance: f64,
}

/// Out-of-band notice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub device_id: String,
    pub severity: Severity,
    pub message: String,
    pub event_ts: i64,
    pub details: EventDetails,
}

impl EventPayload {
    pub fn new(
        device_id: &str,
        severity: Severity,
        message: &str,
        reading: &Reading,
        ts: i64,
    ) -> Self {
        Self {
            device_id: device_id.to_string(),
            severity,
            message: message.to_string(),
            event_ts: ts,
            details: EventDetails {
                temp: round_to(reading.temperature, 2),
                vib: round_to(reading.vibration, 3),
                distance: round_to(reading.distance, 1),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn reading() -> Reading {
        Reading {
            temperature: 36.4567,
            vibration: 1.23456,
            distance: 87.66,
            battery: 64,
            timestamp: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round_to(36.4567, 2), 36.46);
        assert_eq!(round_to(1.23456, 3), 1.235);
        assert_eq!(round_to(87.66, 1), 87.7);
        assert_eq!(round_to(-0.04, 1), -0.0);
    }

    #[test]
    fn test_telemetry_field_names() {
        let payload = TelemetryPayload::new(
            "aegis-one-m5-01",
            &reading(),
            StatusLevel::Warning,
            ProximityLevel::Warning,
            1_700_000_000_123,
        );
        let json: Value = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["deviceId"], "aegis-one-m5-01");
        assert_eq!(json["temp"], 36.46);
        assert_eq!(json["vib"], 1.235);
        assert_eq!(json["distance"], 87.7);
        assert_eq!(json["proximity"], "WARNING");
        assert_eq!(json["status"], "WARNING");
        assert_eq!(json["battery"], 64);
        assert_eq!(json["ts"], 1_700_000_000_123i64);
        assert_eq!(json.as_object().unwrap().len(), 8);
    }

    #[test]
    fn test_telemetry_reparse_keeps_rounded_fields() {
        let payload = TelemetryPayload::new(
            "node-7",
            &reading(),
            StatusLevel::Running,
            ProximityLevel::Safe,
            5,
        );
        let bytes = serde_json::to_vec(&payload).unwrap();
        let parsed: TelemetryPayload = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(parsed.device_id, "node-7");
        assert_eq!(parsed.temp, 36.46);
        assert_eq!(parsed.vib, 1.235);
        assert_eq!(parsed.distance, 87.7);
        assert_eq!(parsed, payload);
    }

    #[test]
    fn test_event_shape() {
        let event = EventPayload::new(
            "aegis-one-m5-01",
            Severity::Critical,
            "Critical threshold exceeded",
            &reading(),
            99,
        );
        let json: Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["severity"], "CRITICAL");
        assert_eq!(json["message"], "Critical threshold exceeded");
        assert_eq!(json["eventTs"], 99);
        assert_eq!(json["details"]["temp"], 36.46);
        assert_eq!(json["details"]["vib"], 1.235);
        assert_eq!(json["details"]["distance"], 87.7);
    }
}
