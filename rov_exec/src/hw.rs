//! # Hardware module
//!
//! Builds every hardware handle the rover needs for the selected backend. Each
//! handle is created exactly once here and then handed to the component which
//! owns it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::info;
use serde::Deserialize;

use crate::{
    cam::{CamError, CamOpener, SimCamOpener},
    elec_driver::{ElecDriverError, MotorDriver, SimDriver},
    gps::{NmeaPortOpener, SimNmeaOpener},
    params::RovExecParams,
    range_sensor::{DistanceSource, SimRangeSensor},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Hardware handles, not yet owned by any component.
///
/// The camera and GPS are only present if enabled in the parameters.
pub struct Hardware {
    pub motors: Box<dyn MotorDriver>,
    pub range: Box<dyn DistanceSource>,
    pub cam: Option<Box<dyn CamOpener>>,
    pub gps: Option<Box<dyn NmeaPortOpener>>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HwBackend {
    /// Raspberry Pi GPIO, V4L2 camera and serial GPS
    Gpio,

    /// Simulated devices
    Sim,
}

#[derive(Debug, thiserror::Error)]
pub enum HwError {
    #[error("Could not initialise the electronics: {0}")]
    Elec(#[from] ElecDriverError),

    #[error("Could not configure the camera: {0}")]
    Cam(#[from] CamError),

    #[error("The GPIO backend is not available on this platform")]
    GpioUnsupported,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for HwBackend {
    fn default() -> Self {
        HwBackend::Sim
    }
}

impl Hardware {
    /// Build the hardware for the backend selected in the parameters.
    pub fn build(params: &RovExecParams) -> Result<Self, HwError> {
        let hw = match params.hw_backend {
            HwBackend::Gpio => build_gpio(params)?,
            HwBackend::Sim => Self::sim(params),
        };

        info!("{:?} hardware initialised", params.hw_backend);

        Ok(hw)
    }

    /// Simulated hardware. The range sensor never sees an obstacle.
    pub fn sim(params: &RovExecParams) -> Self {
        Self {
            motors: Box::new(SimDriver::new()),
            range: Box::new(SimRangeSensor::new()),
            cam: params
                .cam
                .as_ref()
                .map(|c| Box::new(SimCamOpener::new(c.width, c.height, true)) as Box<dyn CamOpener>),
            gps: params
                .gps
                .as_ref()
                .map(|_| Box::new(SimNmeaOpener::new()) as Box<dyn NmeaPortOpener>),
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

#[cfg(all(target_os = "linux", any(target_arch = "arm", target_arch = "aarch64")))]
fn build_gpio(params: &RovExecParams) -> Result<Hardware, HwError> {
    use crate::{cam::V4lOpener, elec_driver::gpio::GpioDriver, gps::SerialOpener, range_sensor};

    let cam = match &params.cam {
        Some(c) => Some(Box::new(V4lOpener::new(c)?) as Box<dyn CamOpener>),
        None => None,
    };

    Ok(Hardware {
        motors: Box::new(GpioDriver::new(&params.elec_driver)?),
        range: Box::new(range_sensor::gpio::open(&params.range)?),
        cam,
        gps: params
            .gps
            .as_ref()
            .map(|g| Box::new(SerialOpener::new(g)) as Box<dyn NmeaPortOpener>),
    })
}

#[cfg(not(all(target_os = "linux", any(target_arch = "arm", target_arch = "aarch64"))))]
fn build_gpio(_params: &RovExecParams) -> Result<Hardware, HwError> {
    Err(HwError::GpioUnsupported)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
