//! Host platform (linux for example) utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::env;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Environment variable pointing at the root of the software installation.
pub const SW_ROOT_ENV_VAR: &str = "ROVER_SW_ROOT";

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Retrieve uname information.
pub fn get_uname() -> std::io::Result<uname::Info> {
    uname::uname()
}

/// Get the root directory of the software, which contains the `params` and
/// `sessions` directories.
pub fn get_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
