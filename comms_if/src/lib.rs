//! # Communications interface crate.
//!
//! Provides the wire-level types exchanged between the rover's control core and its web boundary.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Telecommands sent to the rover by an operator
pub mod tc;

/// Data reported by equipment (like the GPS receiver)
pub mod eqpt;
