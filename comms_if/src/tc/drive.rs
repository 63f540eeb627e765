//! # Drive telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A motion command for the differential drive.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriveCmd {
    /// Both tracks forwards
    Forward,

    /// Both tracks in reverse
    Backward,

    /// Turn on the spot to the left, left track reversing
    Left,

    /// Turn on the spot to the right, right track reversing
    Right,

    /// All outputs off
    Stop,
}

/// Reasons a string can't be converted into a [`DriveCmd`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DriveCmdParseError {
    #[error("command must not be empty")]
    Empty,

    #[error("invalid command: {0}")]
    Unknown(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DriveCmd {
    /// Every valid command.
    pub const ALL: [DriveCmd; 5] = [
        DriveCmd::Forward,
        DriveCmd::Backward,
        DriveCmd::Left,
        DriveCmd::Right,
        DriveCmd::Stop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DriveCmd::Forward => "forward",
            DriveCmd::Backward => "backward",
            DriveCmd::Left => "left",
            DriveCmd::Right => "right",
            DriveCmd::Stop => "stop",
        }
    }

    /// True for every command except `Stop`.
    pub fn is_moving(&self) -> bool {
        !matches!(self, DriveCmd::Stop)
    }
}

impl Default for DriveCmd {
    fn default() -> Self {
        DriveCmd::Stop
    }
}

impl fmt::Display for DriveCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DriveCmd {
    type Err = DriveCmdParseError;

    /// Parse a command, ignoring leading and trailing whitespace. Matching is case sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if s.is_empty() {
            return Err(DriveCmdParseError::Empty);
        }

        DriveCmd::ALL
            .iter()
            .find(|c| c.as_str() == s)
            .copied()
            .ok_or_else(|| DriveCmdParseError::Unknown(s.to_string()))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
