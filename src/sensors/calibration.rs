// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Raw value to engineering unit conversions

use std::time::Duration;

/// Speed of sound in cm/µs at room temperature
const SOUND_CM_PER_US: f64 = 0.034;

/// Acceleration magnitude with the 1 g gravity bias removed.
///
/// The absolute value is taken so that a device reading slightly under 1 g
/// at rest does not look calmer than one reading exactly 1 g.
pub fn vibration_magnitude(axes: [f64; 3]) -> f64 {
    let [ax, ay, az] = axes;
    ((ax * ax + ay * ay + az * az).sqrt() - 1.0).abs()
}

/// Round-trip echo time to one-way distance in centimetres
pub fn echo_to_distance(echo: Duration) -> f64 {
    echo.as_micros() as f64 * SOUND_CM_PER_US / 2.0
}

/// Whether a distance lies strictly inside the sensor's usable window
pub fn distance_in_range(distance: f64, min_cm: f64, max_cm: f64) -> bool {
    distance > min_cm && distance < max_cm
}

/// Linear battery estimate between two calibration voltages, clamped to 0..=100
pub fn battery_percent(volts: f64, empty_volts: f64, full_volts: f64) -> u8 {
    let span = full_volts - empty_volts;
    if !volts.is_finite() || span <= 0.0 {
        return 0;
    }
    let percent = ((volts - empty_volts) / span * 100.0).trunc();
    percent.clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vibration_at_rest_is_zero() {
        assert!(vibration_magnitude([0.0, 0.0, 1.0]) < 1e-12);
    }

    #[test]
    fn test_vibration_below_gravity_is_positive() {
        let v = vibration_magnitude([0.0, 0.0, 0.7]);
        assert!((v - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_vibration_shock() {
        let v = vibration_magnitude([2.0, 0.0, 0.0]);
        assert!((v - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_echo_conversion() {
        // 5882 µs round trip ≈ 100 cm
        let d = echo_to_distance(Duration::from_micros(5882));
        assert!((d - 99.994).abs() < 1e-3);
    }

    #[test]
    fn test_distance_window_is_exclusive() {
        assert!(!distance_in_range(2.0, 2.0, 400.0));
        assert!(distance_in_range(2.1, 2.0, 400.0));
        assert!(distance_in_range(399.9, 2.0, 400.0));
        assert!(!distance_in_range(400.0, 2.0, 400.0));
    }

    #[test]
    fn test_battery_clamped() {
        assert_eq!(battery_percent(3.0, 3.2, 4.2), 0);
        assert_eq!(battery_percent(3.2, 3.2, 4.2), 0);
        assert_eq!(battery_percent(4.2, 3.2, 4.2), 100);
        assert_eq!(battery_percent(4.5, 3.2, 4.2), 100);
        assert_eq!(battery_percent(3.7, 3.2, 4.2), 50);
    }

    #[test]
    fn test_battery_monotonic() {
        let mut previous = 0;
        for step in 0..=200 {
            let volts = 3.0 + step as f64 * 0.01;
            let percent = battery_percent(volts, 3.2, 4.2);
            assert!(percent >= previous, "{} V gave {} after {}", volts, percent, previous);
            previous = percent;
        }
        assert_eq!(previous, 100);
    }

    #[test]
    fn test_battery_nan_reads_empty() {
        assert_eq!(battery_percent(f64::NAN, 3.2, 4.2), 0);
    }
}
