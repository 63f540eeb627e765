//! # Electronics driver parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Wiring of an L298N style dual H-bridge board. Pin numbers are BCM.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ElecDriverParams {
    /// Software PWM frequency on the enable pins.
    ///
    /// Units: Hz
    pub pwm_freq_hz: f64,

    /// Left track enable (PWM)
    pub ena_pin: u8,

    /// Left track direction pins
    pub in1_pin: u8,
    pub in2_pin: u8,

    /// Right track direction pins
    pub in3_pin: u8,
    pub in4_pin: u8,

    /// Right track enable (PWM)
    pub enb_pin: u8,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ElecDriverParams {
    fn default() -> Self {
        Self {
            pwm_freq_hz: 500.0,
            ena_pin: 23,
            in1_pin: 4,
            in2_pin: 17,
            in3_pin: 27,
            in4_pin: 22,
            enb_pin: 24,
        }
    }
}
