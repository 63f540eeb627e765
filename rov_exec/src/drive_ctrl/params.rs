//! Parameters structure for DriveCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for drive control.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DriveCtrlParams {
    /// Duty cycle applied to both tracks for any moving command. `Stop` always uses 0.
    ///
    /// Units: percent
    pub duty_cycle_pct: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for DriveCtrlParams {
    fn default() -> Self {
        Self {
            duty_cycle_pct: 40.0,
        }
    }
}
