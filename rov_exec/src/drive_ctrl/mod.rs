//! # Drive control module
//!
//! Drive control owns the rover's current motion command. Every command, whether it comes from
//! the operator or from the obstacle avoidance loop, goes through [`DriveCtrl`] which converts
//! it into a [`DriveIntent`] and applies it to the motor driver before committing it.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod intent;
mod params;
mod state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use intent::*;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during DriveCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum DriveCtrlError {
    #[error(transparent)]
    Parse(#[from] comms_if::tc::drive::DriveCmdParseError),

    #[error("Motor driver could not actuate the command: {0}")]
    Actuation(crate::elec_driver::ElecDriverError),

    #[error("Drive outputs have been released, no further commands are accepted")]
    Released,
}
