//! Sensor module - hardware interfaces, calibration and simulation

mod traits;
mod reader;
mod simulator;
pub mod calibration;

pub use traits::{Channel, ChannelHealth, Reading, SensorError, SensorHardware};
pub use reader::SensorReader;
pub use simulator::SimulatedBoard;
