//! # Rover library.
//!
//! This library allows the rover executable and the tests to access the
//! rover's control components.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

/// Obstacle avoidance - turns the rover away from obstacles while it's moving
pub mod avoid_ctrl;

/// Camera - shared camera handle and the MJPEG frame stream
pub mod cam;

/// Drive control - the current drive command and its execution
pub mod drive_ctrl;

/// Electronics driver - sets the motor driver outputs
pub mod elec_driver;

/// GPS - NMEA ingestion and the latest fix
pub mod gps;

/// Hardware - builds the device handles for the selected backend
pub mod hw;

/// Orchestrator - startup and shutdown of the whole rover
pub mod orchestrator;

/// Rover executable parameters
pub mod params;

/// Range sensor - ultrasonic distance measurement
pub mod range_sensor;

/// Web server - the HTTP interface for operators
pub mod web_server;
