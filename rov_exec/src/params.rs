//! # Rover Executable Parameters
//!
//! This module provides the parameters for the rover executable, loaded from
//! `params/rov_exec.toml`.
//!
//! The obstacle avoidance, GPS and camera sections are optional. Leaving one
//! out of the file disables that component.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use crate::{
    avoid_ctrl::AvoidCtrlParams, cam::CamParams, drive_ctrl::DriveCtrlParams,
    elec_driver::ElecDriverParams, gps::GpsParams, hw::HwBackend,
    range_sensor::RangeSensorParams, web_server::WebParams,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RovExecParams {
    /// Which hardware to drive, `"gpio"` on the rover or `"sim"` anywhere else
    pub hw_backend: HwBackend,

    pub web: WebParams,

    pub drive: DriveCtrlParams,

    pub elec_driver: ElecDriverParams,

    pub range: RangeSensorParams,

    pub avoid: Option<AvoidCtrlParams>,

    pub gps: Option<GpsParams>,

    pub cam: Option<CamParams>,
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
