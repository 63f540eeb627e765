//! # Obstacle avoidance control
//!
//! Samples the range sensor on a fixed period. If the rover is moving and
//! something is closer than the threshold, it takes over the drive for a short
//! maneuver: turn right for a fixed time, then carry on forwards.
//!
//! ```text
//! Idle (stop) --operator--> Moving --obstacle--> Avoiding --done--> Moving (forward)
//! ```

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use params::*;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use comms_if::tc::drive::DriveCmd;
use log::{info, trace, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

// Internal
use crate::drive_ctrl::DriveCtrl;
use crate::range_sensor::{DistanceSource, RangeSample};
use util::time::Clock;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct AvoidCtrl {
    sensor: Box<dyn DistanceSource>,
    drive: Arc<DriveCtrl>,
    clock: Arc<dyn Clock>,

    poll_interval: Duration,
    turn_duration: Duration,
    threshold_cm: f64,

    mode: AvoidMode,
    num_maneuvers: u64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// What the rover was doing as of the last tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvoidMode {
    /// Stopped, obstacles are ignored
    Idle,

    /// Moving under the given command
    Moving(DriveCmd),

    /// Executing an avoidance maneuver
    Avoiding,
}

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Nothing to do
    Clear,

    /// An obstacle was found and the maneuver completed
    Avoided(f64),

    /// An obstacle was found but the drive refused the maneuver
    Failed,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl AvoidCtrl {
    pub fn new(
        sensor: Box<dyn DistanceSource>,
        drive: Arc<DriveCtrl>,
        clock: Arc<dyn Clock>,
        params: &AvoidCtrlParams,
    ) -> Self {
        Self {
            sensor,
            drive,
            clock,
            poll_interval: Duration::from_millis(params.poll_interval_ms),
            turn_duration: Duration::from_millis(params.turn_duration_ms),
            threshold_cm: params.threshold_cm,
            mode: AvoidMode::Idle,
            num_maneuvers: 0,
        }
    }

    pub fn mode(&self) -> AvoidMode {
        self.mode
    }

    /// Number of maneuvers completed since creation.
    pub fn num_maneuvers(&self) -> u64 {
        self.num_maneuvers
    }

    /// Run ticks until `running` is cleared.
    pub fn run(mut self, running: Arc<AtomicBool>) {
        info!(
            "Obstacle avoidance running (threshold {} cm, every {:?})",
            self.threshold_cm, self.poll_interval
        );

        while running.load(Ordering::Relaxed) {
            self.tick();
            self.clock.sleep(self.poll_interval);
        }

        info!(
            "Obstacle avoidance stopped after {} maneuver(s)",
            self.num_maneuvers
        );
    }

    /// Take one sample and react to it.
    pub fn tick(&mut self) -> TickOutcome {
        let sample = self.sensor.measure();
        let current = self.drive.current();

        self.mode = match current.is_moving() {
            true => AvoidMode::Moving(current),
            false => AvoidMode::Idle,
        };

        trace!("Range {:?} while {:?}", sample, self.mode);

        let blocked = current.is_moving() && sample.is_closer_than(self.threshold_cm);

        match sample {
            RangeSample::Distance(d) if blocked => self.avoid(d),
            _ => TickOutcome::Clear,
        }
    }

    fn avoid(&mut self, distance_cm: f64) -> TickOutcome {
        let maneuver = self.drive.begin_maneuver();

        // The operator may have stopped the rover since the sample was taken
        if !maneuver.current().is_moving() {
            self.mode = AvoidMode::Idle;
            return TickOutcome::Clear;
        }

        info!("Obstacle at {:.2} cm, avoiding", distance_cm);
        self.mode = AvoidMode::Avoiding;

        if let Err(e) = maneuver.apply(DriveCmd::Right) {
            warn!("Could not start avoidance maneuver: {}", e);
            return TickOutcome::Failed;
        }

        self.clock.sleep(self.turn_duration);

        if let Err(e) = maneuver.apply(DriveCmd::Forward) {
            warn!("Could not complete avoidance maneuver: {}", e);
            return TickOutcome::Failed;
        }

        self.mode = AvoidMode::Moving(DriveCmd::Forward);
        self.num_maneuvers += 1;

        TickOutcome::Avoided(distance_cm)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
