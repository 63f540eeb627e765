//! Utility library for the rover software

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod host;
pub mod logger;
pub mod params;
pub mod session;
pub mod time;
