//! # GPS module
//!
//! Reads NMEA sentences from a serial GPS receiver on a background thread and
//! publishes the latest fix for anyone to read.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod ingest;
mod nmea;
mod params;
mod serial;
mod sim;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use ingest::*;
pub use nmea::*;
pub use params::*;
pub use serial::*;
pub use sim::*;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::gps::GpsFix;
use std::sync::RwLock;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A line oriented connection to a GPS receiver.
pub trait NmeaPort: Send {
    /// Read the next line.
    ///
    /// Returns `Ok(None)` if no complete line arrived before the read timeout.
    fn read_line(&mut self) -> Result<Option<String>, GpsError>;
}

/// Opens (and reopens) the connection to the receiver.
pub trait NmeaPortOpener: Send {
    fn open(&mut self) -> Result<Box<dyn NmeaPort>, GpsError>;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The latest fix, shared between the ingestor and its readers.
///
/// The fix is always replaced as a whole.
#[derive(Debug, Default)]
pub struct GpsStore {
    fix: RwLock<GpsFix>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors with the connection to the receiver.
#[derive(Debug, thiserror::Error)]
pub enum GpsError {
    #[error("Could not open the serial port: {0}")]
    Serial(#[from] serialport::Error),

    #[error("Serial read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("The receiver disconnected")]
    Disconnected,
}

/// Reasons a line doesn't produce a fix.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GpsParseError {
    #[error("Not a GGA or RMC sentence")]
    Unsupported,

    #[error("Sentence doesn't contain a valid fix")]
    NoFix,

    #[error("Sentence is incomplete")]
    Incomplete,

    #[error("Malformed sentence: {0}")]
    Malformed(String),

    #[error("Malformed time field: {0:?}")]
    InvalidTime(String),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl GpsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the latest fix.
    pub fn latest(&self) -> GpsFix {
        self.fix.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Replace the whole fix.
    pub fn replace(&self, fix: GpsFix) {
        *self.fix.write().unwrap_or_else(|e| e.into_inner()) = fix;
    }
}
