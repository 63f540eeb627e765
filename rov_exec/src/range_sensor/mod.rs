//! # Range sensor module
//!
//! Ultrasonic (HC-SR04 style) distance measurement. A measurement pulses the
//! trigger pin and times how long the echo pin stays high, with every wait
//! bounded so a disconnected or stuck sensor can't hang the caller.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod sensor;
mod sim;

/// GPIO pin implementations, only available on the Raspberry Pi.
#[cfg(all(target_os = "linux", any(target_arch = "arm", target_arch = "aarch64")))]
pub mod gpio;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use sensor::*;
pub use sim::*;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Half the speed of sound in air, converts a round trip echo time into a one way distance.
///
/// Units: centimeters/second
pub const HALF_SPEED_OF_SOUND_CM_S: f64 = 17150.0;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Anything which can produce distance samples.
pub trait DistanceSource: Send {
    /// Take a single measurement. May block, but must return in bounded time.
    fn measure(&mut self) -> RangeSample;
}

/// Output pin driving the sensor's trigger input.
pub trait TriggerPin: Send {
    fn set_high(&mut self);
    fn set_low(&mut self);
}

/// Input pin reading the sensor's echo output.
pub trait EchoPin: Send {
    fn is_high(&self) -> bool;
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The result of a single measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum RangeSample {
    /// Distance to the nearest object.
    ///
    /// Units: centimeters
    Distance(f64),

    /// The echo didn't start or finish within the timeout.
    Timeout,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RangeSample {
    /// True if the sample is a distance strictly less than `threshold_cm`.
    ///
    /// A timeout never counts as an obstacle.
    pub fn is_closer_than(&self, threshold_cm: f64) -> bool {
        match self {
            RangeSample::Distance(d) => *d < threshold_cm,
            RangeSample::Timeout => false,
        }
    }
}
