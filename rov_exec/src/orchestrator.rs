//! # Orchestrator
//!
//! Wires the hardware and control components into the running rover and owns
//! the order in which they start and stop.
//!
//! Startup:
//!
//! 1. Drive control takes the motors
//! 2. GPS ingestion thread
//! 3. Camera initialisation, best effort
//! 4. Obstacle avoidance thread
//! 5. Web server
//!
//! Shutdown stops the web server and the avoidance loop, stops the camera,
//! releases the drive outputs and finally joins the GPS thread. It is safe to
//! call more than once and also runs if startup failed part way through.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

// Internal
use crate::{
    avoid_ctrl::AvoidCtrl,
    cam::CamSource,
    drive_ctrl::DriveCtrl,
    gps::{GpsIngestor, GpsStore, IngestExit},
    hw::Hardware,
    params::RovExecParams,
    web_server::{spawn_web_server, WebServer, WebServerError, WebState},
};
use util::time::Clock;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The running rover.
///
/// Dropping the rover shuts it down.
pub struct Rover {
    running: Arc<AtomicBool>,

    drive: Arc<DriveCtrl>,
    gps: Arc<GpsStore>,
    cam: Option<Arc<CamSource>>,

    web: Option<WebServer>,
    avoid_thread: Option<JoinHandle<()>>,
    gps_thread: Option<JoinHandle<IngestExit>>,

    shut_down: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RoverError {
    #[error("Could not start the {0} thread: {1}")]
    ThreadSpawn(&'static str, std::io::Error),

    #[error(transparent)]
    WebServer(#[from] WebServerError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Rover {
    /// Start all enabled components on the given hardware.
    ///
    /// If any step fails everything started so far is shut down again before the
    /// error is returned.
    pub fn start(
        params: &RovExecParams,
        hw: Hardware,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, RoverError> {
        let Hardware {
            motors,
            range,
            cam: cam_opener,
            gps: gps_opener,
        } = hw;

        let mut rover = Self {
            running: Arc::new(AtomicBool::new(true)),
            drive: Arc::new(DriveCtrl::new(motors, params.drive.clone())),
            gps: Arc::new(GpsStore::new()),
            cam: None,
            web: None,
            avoid_thread: None,
            gps_thread: None,
            shut_down: false,
        };

        // ---- GPS ----

        match (&params.gps, gps_opener) {
            (Some(gps_params), Some(opener)) => {
                let ingestor =
                    GpsIngestor::new(opener, rover.gps.clone(), clock.clone(), gps_params);
                let running = rover.running.clone();

                let handle = thread::Builder::new()
                    .name("gps-ingest".into())
                    .spawn(move || ingestor.run(running))
                    .map_err(|e| RoverError::ThreadSpawn("GPS", e))?;

                rover.gps_thread = Some(handle);
                info!("GPS ingestion started");
            }
            _ => info!("GPS disabled"),
        }

        // ---- CAMERA ----

        match (&params.cam, cam_opener) {
            (Some(cam_params), Some(opener)) => {
                let cam = Arc::new(CamSource::new(opener, clock.clone(), cam_params));

                // A missing camera only degrades the video feed
                if let Err(e) = cam.initialize() {
                    warn!("Camera not available at startup, will retry when streamed: {}", e);
                }

                rover.cam = Some(cam);
            }
            _ => info!("Camera disabled"),
        }

        // ---- OBSTACLE AVOIDANCE ----

        match &params.avoid {
            Some(avoid_params) => {
                let avoid = AvoidCtrl::new(range, rover.drive.clone(), clock, avoid_params);
                let running = rover.running.clone();

                let handle = thread::Builder::new()
                    .name("obstacle-avoid".into())
                    .spawn(move || avoid.run(running))
                    .map_err(|e| RoverError::ThreadSpawn("obstacle avoidance", e))?;

                rover.avoid_thread = Some(handle);
                info!("Obstacle avoidance started");
            }
            None => info!("Obstacle avoidance disabled"),
        }

        // ---- WEB SERVER ----

        let state = WebState::new(
            rover.drive.clone(),
            rover.gps.clone(),
            rover.cam.clone(),
            rover.running.clone(),
        );
        rover.web = Some(spawn_web_server(&params.web, state)?);

        info!("Rover started");

        Ok(rover)
    }

    pub fn drive(&self) -> &Arc<DriveCtrl> {
        &self.drive
    }

    pub fn gps(&self) -> &Arc<GpsStore> {
        &self.gps
    }

    pub fn cam(&self) -> Option<&Arc<CamSource>> {
        self.cam.as_ref()
    }

    /// Address of the web server, if it is running.
    pub fn web_addr(&self) -> Option<SocketAddr> {
        self.web.as_ref().map(|w| w.addr())
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Stop everything and put the outputs in a safe state.
    ///
    /// Calling this more than once has no further effect.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        info!("Shutting down the rover");

        self.running.store(false, Ordering::SeqCst);

        if let Some(mut web) = self.web.take() {
            web.stop();
        }

        if let Some(handle) = self.avoid_thread.take() {
            if handle.join().is_err() {
                error!("Obstacle avoidance thread panicked");
            }
        }

        if let Some(cam) = &self.cam {
            cam.shutdown();
        }

        if let Err(e) = self.drive.release() {
            error!("Could not release the drive outputs: {}", e);
        }

        if let Some(handle) = self.gps_thread.take() {
            match handle.join() {
                Ok(exit) => info!("GPS thread exited: {:?}", exit),
                Err(_) => error!("GPS thread panicked"),
            }
        }

        info!("Rover shut down");
    }
}

impl Drop for Rover {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        avoid_ctrl::AvoidCtrlParams,
        cam::{CamParams, SimCamOpener, SimCamState},
        drive_ctrl::DriveIntent,
        elec_driver::{IntentLog, SimDriver},
        gps::{GpsParams, SimNmeaOpener},
        range_sensor::SimRangeSensor,
        web_server::WebParams,
    };
    use comms_if::tc::drive::DriveCmd;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::time::{Duration, Instant};
    use util::time::SystemClock;

    fn params(port: u16) -> RovExecParams {
        RovExecParams {
            web: WebParams {
                host: "127.0.0.1".into(),
                port,
                ..Default::default()
            },
            avoid: Some(AvoidCtrlParams::default()),
            gps: Some(GpsParams {
                poll_interval_ms: 10,
                ..Default::default()
            }),
            cam: Some(CamParams {
                width: 32,
                height: 24,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn hardware(distances: &[f64]) -> (Hardware, IntentLog, SimCamState) {
        let (driver, log) = SimDriver::with_log();
        let cam = SimCamOpener::new(32, 24, true);
        let cam_state = cam.state();

        let hw = Hardware {
            motors: Box::new(driver),
            range: Box::new(SimRangeSensor::from_distances(distances)),
            cam: Some(Box::new(cam)),
            gps: Some(Box::new(SimNmeaOpener::new())),
        };

        (hw, log, cam_state)
    }

    fn http(addr: SocketAddr, request: &str) -> String {
        let mut conn = TcpStream::connect(addr).unwrap();
        conn.write_all(request.as_bytes()).unwrap();

        let mut response = String::new();
        conn.read_to_string(&mut response).unwrap();
        response
    }

    fn wait_for<F: Fn() -> bool>(cond: F) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_start_and_shutdown() {
        let (hw, log, cam_state) = hardware(&[]);
        let mut rover = Rover::start(&params(0), hw, Arc::new(SystemClock)).unwrap();

        assert!(rover.cam().unwrap().is_initialized());

        let addr = rover.web_addr().unwrap();
        let body = r#"{"command":"forward"}"#;
        let response = http(
            addr,
            &format!(
                "POST /send_command HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            ),
        );
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("command executed: forward"));
        assert_eq!(rover.drive().current(), DriveCmd::Forward);

        let gps = rover.gps().clone();
        assert!(wait_for(|| !gps.latest().is_empty()));

        rover.shutdown();
        rover.shutdown();

        assert!(rover.is_shut_down());
        assert!(rover.drive().is_released());
        assert_eq!(log.release_count(), 1);
        assert!(rover.cam().unwrap().is_closed());
        assert_eq!(cam_state.num_stops(), 1);
        assert!(TcpStream::connect(addr).is_err());
    }

    #[test]
    fn test_avoidance_runs() {
        // Enough close readings to still be going once the rover moves
        let (hw, log, _) = hardware(&[12.0; 200]);
        let mut rover = Rover::start(&params(0), hw, Arc::new(SystemClock)).unwrap();

        rover.drive().apply(DriveCmd::Forward).unwrap();

        // Forward, then the maneuver's right turn and forward again
        assert!(wait_for(|| log.intents().len() >= 3));
        let cmds: Vec<_> = [DriveCmd::Forward, DriveCmd::Right, DriveCmd::Forward]
            .iter()
            .map(|c| DriveIntent::from_cmd(*c, 40.0))
            .collect();
        assert_eq!(log.intents()[..3], cmds[..]);

        rover.shutdown();
    }

    #[test]
    fn test_partial_startup_is_cleaned_up() {
        // Occupy a port so the web server can't bind it
        let blocker = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = blocker.local_addr().unwrap().port();

        let (hw, log, cam_state) = hardware(&[]);
        let result = Rover::start(&params(port), hw, Arc::new(SystemClock));

        assert!(matches!(result, Err(RoverError::WebServer(_))));
        assert!(log.is_released());
        assert_eq!(cam_state.num_stops(), 1);
    }

    #[test]
    fn test_optional_components() {
        let params = RovExecParams {
            web: WebParams {
                host: "127.0.0.1".into(),
                port: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        let hw = Hardware::sim(&params);

        let rover = Rover::start(&params, hw, Arc::new(SystemClock)).unwrap();

        assert!(rover.cam().is_none());
        assert!(rover.gps().latest().is_empty());

        let response = http(
            rover.web_addr().unwrap(),
            "GET /video_feed HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        );
        assert!(response.starts_with("HTTP/1.1 503"));

        // Dropping shuts down
        let drive = rover.drive().clone();
        drop(rover);
        assert!(drive.is_released());
    }
}
