// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Simulated sensor board for demo/testing

use async_trait::async_trait;
use rand::prelude::*;
use rand_distr::Normal;
use std::time::Duration;

use super::{SensorError, SensorHardware};

/// Generates plausible readings for every channel of the node.
///
/// The ambient temperature drifts slowly, the accelerometer sits at rest
/// with gravity on Z apart from rare shocks, an object wanders in front of
/// the ultrasonic transducer, and the battery discharges a little per read.
pub struct SimulatedBoard {
    rng: StdRng,
    fault_rate: f64,

    // Simulation state
    ambient: f64,
    drift: f64,
    target_cm: f64,
    battery_volts: f64,
    shock_probability: f64,
}

impl SimulatedBoard {
    pub fn new(fault_rate: f64) -> Self {
        Self::with_rng(StdRng::from_entropy(), fault_rate)
    }

    /// Deterministic board for reproducible runs
    pub fn seeded(seed: u64, fault_rate: f64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), fault_rate)
    }

    fn with_rng(rng: StdRng, fault_rate: f64) -> Self {
        Self {
            rng,
            fault_rate: fault_rate.clamp(0.0, 1.0),
            ambient: 27.0,
            drift: 0.0,
            target_cm: 180.0,
            battery_volts: 4.15,
            shock_probability: 0.01,
        }
    }

    fn maybe_fault(&mut self, what: &str) -> Result<(), SensorError> {
        if self.rng.gen::<f64>() < self.fault_rate {
            return Err(SensorError::NotResponding(what.to_string()));
        }
        Ok(())
    }

    fn noise(&mut self, sigma: f64) -> f64 {
        match Normal::new(0.0, sigma) {
            Ok(dist) => self.rng.sample(dist),
            Err(_) => 0.0,
        }
    }
}

#[async_trait]
impl SensorHardware for SimulatedBoard {
    async fn read_temperature(&mut self) -> Result<f64, SensorError> {
        self.maybe_fault("temperature")?;
        self.drift = (self.drift + self.rng.gen_range(-0.05..0.05)).clamp(-5.0, 20.0);
        let noise = self.noise(0.1);
        Ok(self.ambient + self.drift + noise)
    }

    async fn read_acceleration(&mut self) -> Result<[f64; 3], SensorError> {
        self.maybe_fault("imu")?;
        let mut axes = [self.noise(0.01), self.noise(0.01), 1.0 + self.noise(0.01)];

        if self.rng.gen::<f64>() < self.shock_probability {
            let axis = self.rng.gen_range(0..3);
            axes[axis] += self.rng.gen_range(1.0..3.0);
        }

        Ok(axes)
    }

    async fn read_echo_duration(&mut self, timeout: Duration) -> Result<Duration, SensorError> {
        self.maybe_fault("ultrasonic")?;
        self.target_cm = (self.target_cm + self.rng.gen_range(-6.0..6.0)).clamp(10.0, 350.0);

        // round trip at 0.034 cm/µs
        let micros = (self.target_cm * 2.0 / 0.034 + self.noise(20.0)).max(0.0);
        let echo = Duration::from_micros(micros as u64);
        if echo > timeout {
            return Err(SensorError::EchoTimeout(timeout));
        }
        Ok(echo)
    }

    async fn read_battery_voltage(&mut self) -> Result<f64, SensorError> {
        self.maybe_fault("power management")?;
        self.battery_volts = (self.battery_volts - 0.00005).max(3.0);
        Ok(self.battery_volts + self.noise(0.002))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_board_stays_in_plausible_ranges() {
        let mut board = SimulatedBoard::seeded(7, 0.0);

        for _ in 0..500 {
            let t = board.read_temperature().await.unwrap();
            assert!((15.0..60.0).contains(&t));

            let axes = board.read_acceleration().await.unwrap();
            assert!(axes[2] > 0.9);

            let echo = board.read_echo_duration(Duration::from_micros(30_000)).await.unwrap();
            assert!(echo < Duration::from_micros(30_000));

            let v = board.read_battery_voltage().await.unwrap();
            assert!((2.9..4.3).contains(&v));
        }
    }

    #[tokio::test]
    async fn test_full_fault_rate_always_fails() {
        let mut board = SimulatedBoard::seeded(1, 1.0);
        assert!(board.read_temperature().await.is_err());
        assert!(board.read_acceleration().await.is_err());
        assert!(board.read_battery_voltage().await.is_err());
    }

    #[tokio::test]
    async fn test_short_timeout_reports_echo_timeout() {
        let mut board = SimulatedBoard::seeded(3, 0.0);
        let timeout = Duration::from_micros(10);
        assert_eq!(
            board.read_echo_duration(timeout).await,
            Err(SensorError::EchoTimeout(timeout))
        );
    }
}
