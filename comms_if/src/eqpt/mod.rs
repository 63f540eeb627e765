//! # Equipment Interface
//!
//! This module defines the data structures reported by the rover's equipment.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod gps;
