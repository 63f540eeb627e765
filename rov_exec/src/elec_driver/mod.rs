//! # Electronics driver module
//!
//! This module interfaces with the rover's motor driver board. It takes a
//! `drive_ctrl::DriveIntent` and sets the PWM duty cycle and direction pins
//! of each H-bridge channel to match.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod params;
pub mod sim;

/// GPIO implementation, only available on the Raspberry Pi.
#[cfg(all(target_os = "linux", any(target_arch = "arm", target_arch = "aarch64")))]
pub mod gpio;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use sim::*;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use thiserror::Error;

use crate::drive_ctrl::DriveIntent;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Unified API over the boards that can drive the tracks.
pub trait MotorDriver: Send {
    /// Set both tracks to the given intent.
    fn apply(&mut self, intent: &DriveIntent) -> Result<(), ElecDriverError>;

    /// Turn all outputs off and give up the underlying hardware.
    ///
    /// After a release `apply` must fail with `ElecDriverError::Released`.
    fn release(&mut self) -> Result<(), ElecDriverError>;
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ElecDriverError {
    #[cfg(all(target_os = "linux", any(target_arch = "arm", target_arch = "aarch64")))]
    #[error("GPIO error: {0}")]
    Gpio(#[from] rppal::gpio::Error),

    #[error("The motor driver has already been released")]
    Released,

    #[error("Simulated motor driver fault")]
    SimFault,
}
