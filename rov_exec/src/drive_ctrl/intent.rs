//! Drive intents, the per-track demands derived from a command

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::tc::drive::DriveCmd;
use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Demands for both tracks, computed from a [`DriveCmd`] at dispatch time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DriveIntent {
    pub left: TrackDemand,
    pub right: TrackDemand,
}

/// Demand for a single track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrackDemand {
    /// Units: percent, 0 to 100
    pub duty_cycle_pct: f64,

    pub dir: TrackDir,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Direction of a track, which maps onto the pair of direction pins of an H-bridge channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrackDir {
    Fwd,
    Rev,
    Off,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DriveIntent {
    /// Build the intent for a command.
    ///
    /// | command  | left | right |
    /// |----------|------|-------|
    /// | forward  | fwd  | fwd   |
    /// | backward | rev  | rev   |
    /// | left     | rev  | fwd   |
    /// | right    | fwd  | rev   |
    /// | stop     | off  | off   |
    pub fn from_cmd(cmd: DriveCmd, duty_cycle_pct: f64) -> Self {
        let (left, right) = match cmd {
            DriveCmd::Forward => (TrackDir::Fwd, TrackDir::Fwd),
            DriveCmd::Backward => (TrackDir::Rev, TrackDir::Rev),
            DriveCmd::Left => (TrackDir::Rev, TrackDir::Fwd),
            DriveCmd::Right => (TrackDir::Fwd, TrackDir::Rev),
            DriveCmd::Stop => return Self::stop(),
        };

        let duty_cycle_pct = duty_cycle_pct.max(0.0).min(100.0);

        Self {
            left: TrackDemand {
                duty_cycle_pct,
                dir: left,
            },
            right: TrackDemand {
                duty_cycle_pct,
                dir: right,
            },
        }
    }

    /// Zero duty cycle, all direction pins off.
    pub fn stop() -> Self {
        let off = TrackDemand {
            duty_cycle_pct: 0.0,
            dir: TrackDir::Off,
        };

        Self {
            left: off,
            right: off,
        }
    }
}

impl Default for DriveIntent {
    fn default() -> Self {
        Self::stop()
    }
}

impl TrackDir {
    /// Logic levels for the (IN1, IN2) pins of the H-bridge channel.
    pub fn pin_levels(&self) -> (bool, bool) {
        match self {
            TrackDir::Fwd => (true, false),
            TrackDir::Rev => (false, true),
            TrackDir::Off => (false, false),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_truth_table() {
        let table = [
            (DriveCmd::Forward, TrackDir::Fwd, TrackDir::Fwd),
            (DriveCmd::Backward, TrackDir::Rev, TrackDir::Rev),
            (DriveCmd::Left, TrackDir::Rev, TrackDir::Fwd),
            (DriveCmd::Right, TrackDir::Fwd, TrackDir::Rev),
        ];

        for (cmd, left, right) in table.iter() {
            let intent = DriveIntent::from_cmd(*cmd, 40.0);
            assert_eq!(intent.left.dir, *left, "{}", cmd);
            assert_eq!(intent.right.dir, *right, "{}", cmd);
            assert_eq!(intent.left.duty_cycle_pct, 40.0);
            assert_eq!(intent.right.duty_cycle_pct, 40.0);
        }

        // Stop ignores the configured duty cycle
        assert_eq!(DriveIntent::from_cmd(DriveCmd::Stop, 40.0), DriveIntent::stop());
        assert_eq!(DriveIntent::stop().left.duty_cycle_pct, 0.0);
    }

    #[test]
    fn test_duty_cycle_clamped() {
        assert_eq!(
            DriveIntent::from_cmd(DriveCmd::Forward, 150.0).left.duty_cycle_pct,
            100.0
        );
        assert_eq!(
            DriveIntent::from_cmd(DriveCmd::Forward, -5.0).right.duty_cycle_pct,
            0.0
        );
    }

    #[test]
    fn test_pin_levels() {
        assert_eq!(TrackDir::Fwd.pin_levels(), (true, false));
        assert_eq!(TrackDir::Rev.pin_levels(), (false, true));
        assert_eq!(TrackDir::Off.pin_levels(), (false, false));
    }
}
