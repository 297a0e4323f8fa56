// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Dashboard display

use chrono::{Local, TimeZone};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::ThresholdConfig;
use crate::detection::{channel_level, BatteryBand, ProximityLevel, StatusLevel};
use crate::sensors::Reading;

/// Display faults
#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("display unavailable: {0}")]
    Unavailable(String),
}

/// Connectivity shown in the dashboard header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStatus {
    pub wifi: bool,
    pub cloud: bool,
}

/// Everything the dashboard shows for one tick
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardFrame {
    pub reading: Reading,
    pub status: StatusLevel,
    pub proximity: ProximityLevel,
    pub temperature_level: StatusLevel,
    pub vibration_level: StatusLevel,
    pub battery_band: BatteryBand,
    pub links: LinkStatus,
    pub paused: bool,
}

impl DashboardFrame {
    pub fn new(
        reading: Reading,
        status: StatusLevel,
        proximity: ProximityLevel,
        thresholds: &ThresholdConfig,
        links: LinkStatus,
        paused: bool,
    ) -> Self {
        Self {
            reading,
            status,
            proximity,
            temperature_level: channel_level(
                reading.temperature,
                thresholds.temp_warn,
                thresholds.temp_crit,
            ),
            vibration_level: channel_level(
                reading.vibration,
                thresholds.vib_warn,
                thresholds.vib_crit,
            ),
            battery_band: BatteryBand::from_percent(reading.battery),
            links,
            paused,
        }
    }

    /// Header badge text
    pub fn headline(&self) -> &'static str {
        if self.paused {
            "PAUSED"
        } else {
            self.status.as_str()
        }
    }

    /// Local wall-clock time of the reading, `HH:MM:SS`
    pub fn updated_at(&self) -> String {
        match Local.timestamp_millis_opt(self.reading.timestamp).single() {
            Some(t) => t.format("%H:%M:%S").to_string(),
            None => "--:--:--".to_string(),
        }
    }
}

/// Dashboard renderer
pub trait Display: Send {
    fn render(&mut self, frame: &DashboardFrame) -> Result<(), DisplayError>;

    /// Transient status text (connection progress and the like)
    fn show_status(&mut self, text: &str);

    /// Terminal error screen
    fn show_fatal(&mut self, message: &str);
}

/// Renders the dashboard into the log.
///
/// Every frame goes out at `debug`; a line at `info` is written only when
/// the headline, proximity or link state changes.
#[derive(Debug, Default)]
pub struct ConsoleDisplay {
    last: Option<(&'static str, ProximityLevel, LinkStatus)>,
}

impl ConsoleDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Display for ConsoleDisplay {
    fn render(&mut self, frame: &DashboardFrame) -> Result<(), DisplayError> {
        let r = &frame.reading;
        debug!(
            "[{}] {:.1}C {:.2}g {:.0}cm | {} | bat {}% | wifi={} cloud={}",
            frame.updated_at(),
            r.temperature,
            r.vibration,
            r.distance,
            frame.proximity,
            r.battery,
            frame.links.wifi,
            frame.links.cloud,
        );

        let key = (frame.headline(), frame.proximity, frame.links);
        if self.last != Some(key) {
            info!(
                "Status {} | proximity {} ({:.0} cm) | wifi {} | cloud {}",
                frame.headline(),
                frame.proximity,
                r.distance,
                if frame.links.wifi { "up" } else { "down" },
                if frame.links.cloud { "up" } else { "down" },
            );
            self.last = Some(key);
        }

        if frame.battery_band == BatteryBand::Low {
            debug!("Battery low: {}%", r.battery);
        }

        Ok(())
    }

    fn show_status(&mut self, text: &str) {
        info!("{}", text);
    }

    fn show_fatal(&mut self, message: &str) {
        error!("ERROR: {}", message);
    }
}
