//! Obstacle avoidance parameters

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AvoidCtrlParams {
    /// Period between range samples.
    ///
    /// Units: milliseconds
    pub poll_interval_ms: u64,

    /// Obstacles strictly closer than this trigger a maneuver.
    ///
    /// Units: centimeters
    pub threshold_cm: f64,

    /// How long to turn right for before driving forwards again.
    ///
    /// Units: milliseconds
    pub turn_duration_ms: u64,
}

impl Default for AvoidCtrlParams {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10,
            threshold_cm: 30.0,
            turn_duration_ms: 500,
        }
    }
}
