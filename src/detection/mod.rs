//! Detection module - threshold classification of sensor readings

mod classification;

pub use classification::*;
