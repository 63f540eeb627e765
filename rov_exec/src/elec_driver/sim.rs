//! # Simulated motor driver
//!
//! Used when the rover runs without motor hardware, and by tests to observe
//! exactly what reached the outputs.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{ElecDriverError, MotorDriver};
use crate::drive_ctrl::DriveIntent;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Motor driver with no hardware behind it.
#[derive(Default)]
pub struct SimDriver {
    log: IntentLog,
}

/// Shared view of everything a [`SimDriver`] was asked to do.
#[derive(Clone, Default)]
pub struct IntentLog {
    inner: Arc<Mutex<IntentLogInner>>,
}

#[derive(Default)]
struct IntentLogInner {
    intents: Vec<DriveIntent>,
    release_count: usize,
    released: bool,
    fail: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a driver along with a handle on its log.
    pub fn with_log() -> (Self, IntentLog) {
        let driver = Self::new();
        let log = driver.log.clone();
        (driver, log)
    }
}

impl MotorDriver for SimDriver {
    fn apply(&mut self, intent: &DriveIntent) -> Result<(), ElecDriverError> {
        let mut log = self.log.lock();

        if log.released {
            return Err(ElecDriverError::Released);
        }
        if log.fail {
            return Err(ElecDriverError::SimFault);
        }

        trace!("SimDriver: {:?}", intent);
        log.intents.push(*intent);

        Ok(())
    }

    fn release(&mut self) -> Result<(), ElecDriverError> {
        let mut log = self.log.lock();
        log.released = true;
        log.release_count += 1;
        Ok(())
    }
}

impl IntentLog {
    /// Every intent applied so far, oldest first.
    pub fn intents(&self) -> Vec<DriveIntent> {
        self.lock().intents.clone()
    }

    pub fn is_released(&self) -> bool {
        self.lock().released
    }

    pub fn release_count(&self) -> usize {
        self.lock().release_count
    }

    /// Make every following `apply` fail.
    pub fn set_fail(&self, fail: bool) {
        self.lock().fail = fail;
    }

    fn lock(&self) -> MutexGuard<'_, IntentLogInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
