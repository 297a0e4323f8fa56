// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Sensor traits and common types

use std::time::Duration;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sensor channels sampled every tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Temperature,
    Vibration,
    Distance,
    Battery,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::Temperature,
        Channel::Vibration,
        Channel::Distance,
        Channel::Battery,
    ];
}

/// Transient peripheral faults
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SensorError {
    #[error("peripheral not responding: {0}")]
    NotResponding(String),

    #[error("no echo within {0:?}")]
    EchoTimeout(Duration),

    #[error("bus error: {0}")]
    Bus(String),
}

/// One calibrated snapshot of every channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Degrees Celsius
    pub temperature: f64,
    /// Acceleration magnitude in g with gravity removed
    pub vibration: f64,
    /// Centimetres to the nearest echo
    pub distance: f64,
    /// Percent, 0..=100
    pub battery: u8,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl Default for Reading {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            vibration: 0.0,
            distance: 0.0,
            battery: 100,
            timestamp: 0,
        }
    }
}

/// Raw peripheral access for the node's sensor board.
///
/// Each method reads exactly one channel so that a fault stays local to it.
#[async_trait]
pub trait SensorHardware: Send {
    /// Temperature in degrees Celsius
    async fn read_temperature(&mut self) -> Result<f64, SensorError>;

    /// Accelerometer axes (x, y, z) in g
    async fn read_acceleration(&mut self) -> Result<[f64; 3], SensorError>;

    /// Width of the ultrasonic echo pulse. Implementations must give up
    /// after `timeout` and return [`SensorError::EchoTimeout`].
    async fn read_echo_duration(&mut self, timeout: Duration) -> Result<Duration, SensorError>;

    /// Battery terminal voltage
    async fn read_battery_voltage(&mut self) -> Result<f64, SensorError>;
}

/// Per-channel read bookkeeping
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelHealth {
    pub readings_count: u64,
    pub error_count: u64,
    pub rejected_count: u64,
    pub last_error: Option<String>,
}
