//! Generic parameters functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::de::DeserializeOwned;
use std::fs::read_to_string;
use std::path::Path;
use thiserror::Error;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An error that occurs during loading of a parameter file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("The software root environment variable (ROVER_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("Cannot load the parmeter file: {0}")]
    FileLoadError(std::io::Error),

    #[error("Cannot read the parameter file: {0}")]
    DeserialiseError(toml::de::Error)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Load a parameter file
///
/// The file path is relative to the "<ROVER_SW_ROOT>/params" directory
pub fn load<P>(param_file_path: &str) -> Result<P, LoadError> 
where
    P: DeserializeOwned
{
    // Get the params dir
    let mut path = crate::host::get_sw_root()
        .map_err(|_| LoadError::SwRootNotSet)?;
    path.push("params");
    path.push(param_file_path);

    load_path(path)
}

/// Load a parameter file from an explicit path.
pub fn load_path<P, T>(path: T) -> Result<P, LoadError>
where
    P: DeserializeOwned,
    T: AsRef<Path>
{
    // Load the file into a string
    let params_str = match read_to_string(path) {
        Ok(s) => s,
        Err(e) => return Err(LoadError::FileLoadError(e))
    };

    from_str(params_str.as_str())
}

/// Parse parameters from a TOML string.
pub fn from_str<P>(params_str: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned
{
    toml::from_str(params_str).map_err(LoadError::DeserialiseError)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
