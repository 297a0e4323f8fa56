// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Sensor reader - turns raw peripheral reads into a calibrated [`Reading`]

use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use super::calibration::{battery_percent, distance_in_range, echo_to_distance, vibration_magnitude};
use super::{Channel, ChannelHealth, Reading, SensorError, SensorHardware};
use crate::config::SensorConfig;

/// Samples every channel once per call.
///
/// A failing channel keeps its last good value; the other channels are
/// unaffected.
pub struct SensorReader {
    hardware: Box<dyn SensorHardware>,
    config: SensorConfig,
    current: Reading,
    health: HashMap<Channel, ChannelHealth>,
}

impl SensorReader {
    pub fn new(hardware: Box<dyn SensorHardware>, config: SensorConfig) -> Self {
        let health = Channel::ALL
            .iter()
            .map(|channel| (*channel, ChannelHealth::default()))
            .collect();

        Self {
            hardware,
            config,
            current: Reading::default(),
            health,
        }
    }

    /// Sample all channels and stamp the result with `timestamp` (epoch ms)
    pub async fn read(&mut self, timestamp: i64) -> Reading {
        let temperature = self.hardware.read_temperature().await;
        if let Some(value) = self.accept(Channel::Temperature, temperature) {
            self.current.temperature = value;
        }

        let axes = self.hardware.read_acceleration().await;
        if let Some(axes) = self.accept(Channel::Vibration, axes) {
            self.current.vibration = vibration_magnitude(axes);
        }

        let timeout = Duration::from_micros(self.config.echo_timeout_us);
        let echo = self.hardware.read_echo_duration(timeout).await;
        if let Some(echo) = self.accept(Channel::Distance, echo) {
            let distance = echo_to_distance(echo);
            let (min, max) = (self.config.distance_min_cm, self.config.distance_max_cm);
            if distance_in_range(distance, min, max) {
                self.current.distance = distance;
            } else {
                debug!("Rejected out-of-range distance {:.1} cm", distance);
                if let Some(h) = self.health.get_mut(&Channel::Distance) {
                    h.rejected_count += 1;
                }
            }
        }

        let volts = self.hardware.read_battery_voltage().await;
        if let Some(volts) = self.accept(Channel::Battery, volts) {
            self.current.battery = battery_percent(
                volts,
                self.config.battery_empty_volts,
                self.config.battery_full_volts,
            );
        }

        self.current.timestamp = timestamp;
        self.current
    }

    /// Most recent snapshot without touching the hardware
    pub fn current(&self) -> Reading {
        self.current
    }

    pub fn health(&self, channel: Channel) -> Option<&ChannelHealth> {
        self.health.get(&channel)
    }

    fn accept<T>(&mut self, channel: Channel, result: Result<T, SensorError>) -> Option<T> {
        let health = self.health.entry(channel).or_default();
        match result {
            Ok(value) => {
                health.readings_count += 1;
                Some(value)
            }
            Err(e) => {
                debug!("{:?} read error: {}", channel, e);
                health.error_count += 1;
                health.last_error = Some(e.to_string());
                None
            }
        }
    }
}
