// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Aegis One - industrial sensor node
//!
//! Firmware core for a battery-powered monitoring node that:
//! - Samples temperature, vibration, distance and battery every tick
//! - Classifies readings against warning/critical thresholds
//! - Raises local alerts (speaker tones, haptic pulse)
//! - Publishes telemetry and events to an MQTT broker
//! - Accepts remote commands (pause, resume, alert, reboot)
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                       Node Engine                         │
//! ├───────────────────────────────────────────────────────────┤
//! │  ┌─────────┐  ┌───────────┐  ┌────────┐  ┌────────────┐   │
//! │  │ Sensors │→ │ Detection │→ │ Alerts │  │ Streaming  │   │
//! │  │ Reader  │  │ Classify  │→ │        │  │ Publisher  │   │
//! │  └─────────┘  └───────────┘  └────────┘  └────────────┘   │
//! │       ↓             ↓                          ↑ ↓        │
//! │  ┌─────────┐  ┌───────────┐               ┌──────────┐    │
//! │  │ Display │  │ Network   │               │ Commands │    │
//! │  └─────────┘  └───────────┘               └──────────┘    │
//! └───────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod core;
pub mod sensors;
pub mod detection;
pub mod alerts;
pub mod streaming;
pub mod commands;
pub mod network;
pub mod display;

// Re-exports for convenience
pub use config::Config;
pub use core::{Collaborators, Engine, NodeExit, NodeState, RunState};
pub use sensors::{Reading, SensorHardware, SensorReader};
pub use detection::{classify, ProximityLevel, StatusLevel};
pub use streaming::{TelemetryPublisher, Transport};

/// Aegis node version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Aegis node name
pub const NAME: &str = "Aegis One";
