//! Range sensor parameters

use serde::Deserialize;

/// Pin assignments (BCM) and timing of the ultrasonic sensor.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RangeSensorParams {
    pub trigger_pin: u8,
    pub echo_pin: u8,

    /// Time the trigger is held low before the pulse.
    ///
    /// Units: microseconds
    pub settle_us: u64,

    /// Length of the trigger pulse.
    ///
    /// Units: microseconds
    pub pulse_us: u64,

    /// Maximum wait for each edge of the echo.
    ///
    /// Units: milliseconds
    pub echo_timeout_ms: u64,
}

impl Default for RangeSensorParams {
    fn default() -> Self {
        Self {
            trigger_pin: 5,
            echo_pin: 6,
            settle_us: 2,
            pulse_us: 10,
            echo_timeout_ms: 50,
        }
    }
}
