//! Main rover-side executable entry point.
//!
//! # Architecture
//!
//! The executable initialises the session and logging, loads its parameters,
//! builds the hardware and then hands everything to the orchestrator:
//!
//!     - GPS ingestion thread
//!     - Camera, initialised lazily by the video stream
//!     - Obstacle avoidance thread
//!     - Web server thread, serving the control page, video stream, drive
//!       commands and GPS fix
//!
//! The main thread then waits for a termination signal (Ctrl-C or SIGTERM) and
//! shuts the rover down, leaving the motors stopped.
//!
//! # Usage
//!
//! ```text
//! rov_exec [PARAMS_FILE]
//! ```
//!
//! `PARAMS_FILE` is a file name in `$ROVER_SW_ROOT/params`, `rov_exec.toml` by
//! default.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::{eyre, WrapErr}, Report};
use log::{debug, info};
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

// Internal
use rov_lib::{hw::Hardware, orchestrator::Rover, params::RovExecParams};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
    time::SystemClock,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Parameter file loaded if none is given on the command line.
const DEFAULT_PARAMS_FILE: &str = "rov_exec.toml";

/// How often the main thread checks for a termination signal.
const SIGNAL_POLL_PERIOD: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("rov_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Rover Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let args: Vec<String> = env::args().collect();
    debug!("CLI arguments: {:?}", args);

    let params_file = match args.len() {
        1 => DEFAULT_PARAMS_FILE,
        2 => args[1].as_str(),
        n => {
            return Err(eyre!(
                "Expected either zero or one argument, found {}",
                n - 1
            ))
        }
    };

    let params: RovExecParams = util::params::load(params_file)
        .wrap_err_with(|| format!("Could not load parameters from {}", params_file))?;

    info!("Exec parameters loaded from {}", params_file);

    // ---- SIGNAL HANDLING ----

    let terminate = Arc::new(AtomicBool::new(false));
    {
        let terminate = terminate.clone();
        ctrlc::set_handler(move || terminate.store(true, Ordering::SeqCst))
            .wrap_err("Failed to set the termination signal handler")?;
    }

    // ---- START ----

    let hw = Hardware::build(&params).wrap_err("Failed to initialise the hardware")?;

    let mut rover = Rover::start(&params, hw, Arc::new(SystemClock))
        .wrap_err("Failed to start the rover")?;

    if let Some(addr) = rover.web_addr() {
        info!("Control page available at http://{}/", addr);
    }

    // ---- WAIT FOR TERMINATION ----

    while !terminate.load(Ordering::SeqCst) {
        thread::sleep(SIGNAL_POLL_PERIOD);
    }

    info!("Termination signal received");

    rover.shutdown();

    info!("End of execution");

    Ok(())
}
