//! Implementations for the DriveCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use comms_if::tc::drive::DriveCmd;
use log::{debug, info, warn};
use std::sync::{Mutex, MutexGuard};

// Internal
use super::{DriveCtrlError, DriveCtrlParams, DriveIntent};
use crate::elec_driver::MotorDriver;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Shared record of the rover's current motion command.
///
/// Two locks are used:
/// - `gate` serialises writers. It is held for a single command by [`DriveCtrl::apply`] and for
///   a whole sequence of commands by a [`Maneuver`].
/// - `state` guards the command together with the motor driver, so the driver is actuated and
///   the command committed in the same critical section. Readers only take this lock and are
///   never held up by a maneuver in progress.
pub struct DriveCtrl {
    params: DriveCtrlParams,

    gate: Mutex<()>,

    state: Mutex<DriveState>,
}

/// Exclusive write access to [`DriveCtrl`] for a sequence of commands.
///
/// Other writers block until the maneuver is dropped, and are then applied in turn.
pub struct Maneuver<'a> {
    ctrl: &'a DriveCtrl,
    _gate: MutexGuard<'a, ()>,
}

struct DriveState {
    current: DriveCmd,

    last_intent: DriveIntent,

    driver: Box<dyn MotorDriver>,

    released: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DriveCtrl {
    /// Create a new controller over the given driver.
    ///
    /// The current command starts as `Stop`. The driver is expected to start with its outputs
    /// off.
    pub fn new(driver: Box<dyn MotorDriver>, params: DriveCtrlParams) -> Self {
        Self {
            params,
            gate: Mutex::new(()),
            state: Mutex::new(DriveState {
                current: DriveCmd::Stop,
                last_intent: DriveIntent::stop(),
                driver,
                released: false,
            }),
        }
    }

    /// Validate and execute a raw command string.
    ///
    /// Invalid or empty commands are rejected without touching the current command.
    pub fn set_command(&self, raw: &str) -> Result<DriveCmd, DriveCtrlError> {
        let cmd: DriveCmd = raw.parse()?;

        self.apply(cmd)?;

        Ok(cmd)
    }

    /// Execute a command.
    ///
    /// Blocks while a [`Maneuver`] is in progress.
    pub fn apply(&self, cmd: DriveCmd) -> Result<(), DriveCtrlError> {
        let _gate = lock(&self.gate);

        self.apply_locked(cmd)
    }

    /// Take exclusive write access for a sequence of commands.
    pub fn begin_maneuver(&self) -> Maneuver<'_> {
        Maneuver {
            ctrl: self,
            _gate: lock(&self.gate),
        }
    }

    /// The most recently accepted command.
    pub fn current(&self) -> DriveCmd {
        lock(&self.state).current
    }

    /// The intent most recently applied to the motor driver.
    pub fn last_intent(&self) -> DriveIntent {
        lock(&self.state).last_intent
    }

    /// Put the outputs into a safe state and release the motor driver.
    ///
    /// All later commands are rejected with `DriveCtrlError::Released`. Calling this more than
    /// once has no further effect.
    pub fn release(&self) -> Result<(), DriveCtrlError> {
        let _gate = lock(&self.gate);
        let mut state = lock(&self.state);

        if state.released {
            return Ok(());
        }
        state.released = true;

        let stop = DriveIntent::stop();
        if let Err(e) = state.driver.apply(&stop) {
            warn!("Could not stop the motors before release: {}", e);
        }
        state.current = DriveCmd::Stop;
        state.last_intent = stop;

        state.driver.release().map_err(DriveCtrlError::Actuation)?;

        info!("Drive outputs released");

        Ok(())
    }

    /// True once [`DriveCtrl::release`] has been called.
    pub fn is_released(&self) -> bool {
        lock(&self.state).released
    }

    fn apply_locked(&self, cmd: DriveCmd) -> Result<(), DriveCtrlError> {
        let mut state = lock(&self.state);

        if state.released {
            return Err(DriveCtrlError::Released);
        }

        let intent = DriveIntent::from_cmd(cmd, self.params.duty_cycle_pct);

        // Actuate first, the command is only committed if the driver accepted it
        state
            .driver
            .apply(&intent)
            .map_err(DriveCtrlError::Actuation)?;
        state.current = cmd;
        state.last_intent = intent;

        debug!("Applied {}: {:?}", cmd, intent);

        Ok(())
    }
}

impl<'a> Maneuver<'a> {
    /// Execute a command as part of this maneuver.
    pub fn apply(&self, cmd: DriveCmd) -> Result<(), DriveCtrlError> {
        self.ctrl.apply_locked(cmd)
    }

    /// The current command, as seen from inside the maneuver.
    pub fn current(&self) -> DriveCmd {
        self.ctrl.current()
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Lock a mutex, recovering the guard if another thread panicked while holding it.
///
/// Every critical section in this module leaves the state consistent before anything that can
/// panic, so a poisoned lock still holds valid data.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
