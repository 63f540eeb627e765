//! # Telecommand module
//!
//! This module provides the operator command requests and responses handled by the rover's web
//! boundary.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

/// Drive commands
pub mod drive;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Body of a command request, `{"command": "<cmd>"}`.
///
/// The command is kept as a raw string so that empty and unknown commands can be reported back to
/// the operator rather than failing deserialisation.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    #[serde(default)]
    pub command: Option<String>,
}

/// Response to a command request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub status: ResponseStatus,
    pub message: String,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CommandRequest {
    /// The requested command with surrounding whitespace removed, or an empty string if no
    /// command was given.
    pub fn command_str(&self) -> &str {
        self.command.as_deref().unwrap_or("").trim()
    }
}

impl CommandResponse {
    /// Response sent after a command has been executed.
    pub fn success(cmd: drive::DriveCmd) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: format!("command executed: {}", cmd),
        }
    }

    /// Response sent when a command could not be executed.
    pub fn error<S: ToString>(message: S) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: message.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
