//! Background ingestion of NMEA sentences

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, error, info, trace, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

// Internal
use super::{
    is_position_sentence, parse_sentence, GpsError, GpsParams, GpsParseError, GpsStore,
    NmeaPort, NmeaPortOpener,
};
use util::time::Clock;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Longest single sleep while backing off, so that a stop request is noticed promptly.
const BACKOFF_SLICE: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct GpsIngestor {
    opener: Box<dyn NmeaPortOpener>,
    store: Arc<GpsStore>,
    clock: Arc<dyn Clock>,

    poll_interval: Duration,
    initial_backoff: Duration,
    max_backoff: Duration,
    max_retries: Option<u32>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Why the ingestor stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestExit {
    /// The running flag was cleared
    Stopped,

    /// Too many consecutive failures
    RetriesExhausted,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl GpsIngestor {
    pub fn new(
        opener: Box<dyn NmeaPortOpener>,
        store: Arc<GpsStore>,
        clock: Arc<dyn Clock>,
        params: &GpsParams,
    ) -> Self {
        let max_backoff = Duration::from_secs_f64(params.max_backoff_s.max(0.0));

        Self {
            opener,
            store,
            clock,
            poll_interval: Duration::from_millis(params.poll_interval_ms),
            initial_backoff: Duration::from_secs_f64(params.retry_backoff_s.max(0.0))
                .min(max_backoff),
            max_backoff,
            max_retries: params.max_retries,
        }
    }

    /// Process one received line. The stored fix is only replaced if the line
    /// decodes to a full fix.
    pub fn ingest_line(&self, line: &str) -> Result<(), GpsParseError> {
        let fix = parse_sentence(line)?;
        trace!("GPS fix: {:?}", fix);
        self.store.replace(fix);
        Ok(())
    }

    /// Connect to the receiver and ingest sentences until `running` is cleared.
    ///
    /// Failing to open or read the port is never fatal unless `max_retries` is set,
    /// the port is reopened after an exponentially growing wait.
    pub fn run(mut self, running: Arc<AtomicBool>) -> IngestExit {
        let mut failures = 0u32;

        while running.load(Ordering::Relaxed) {
            match self.opener.open() {
                Ok(mut port) => {
                    info!("GPS port open");
                    failures = 0;

                    match self.read_port(port.as_mut(), &running) {
                        Ok(()) => break,
                        Err(e) => warn!("GPS read error: {}", e),
                    }
                }
                Err(e) => warn!("Could not open GPS port: {}", e),
            }

            if !running.load(Ordering::Relaxed) {
                break;
            }

            failures += 1;
            if let Some(max) = self.max_retries {
                if failures > max {
                    error!("GPS unavailable after {} attempt(s), giving up", failures);
                    return IngestExit::RetriesExhausted;
                }
            }

            let backoff = self.backoff(failures);
            warn!("Retrying GPS connection in {:?}", backoff);
            self.sleep_while_running(backoff, &running);
        }

        info!("GPS ingestion stopped");
        IngestExit::Stopped
    }

    /// Wait before the given consecutive failure's retry.
    pub fn backoff(&self, failures: u32) -> Duration {
        let exp = failures.saturating_sub(1).min(31);
        self.initial_backoff
            .checked_mul(1 << exp)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    /// Read until stopped (`Ok`) or the port fails (`Err`).
    fn read_port(
        &self,
        port: &mut dyn NmeaPort,
        running: &AtomicBool,
    ) -> Result<(), GpsError> {
        while running.load(Ordering::Relaxed) {
            if let Some(line) = port.read_line()? {
                if is_position_sentence(&line) {
                    if let Err(e) = self.ingest_line(&line) {
                        debug!("Discarding GPS sentence {:?}: {}", line, e);
                    }
                }
            }

            self.clock.sleep(self.poll_interval);
        }

        Ok(())
    }

    fn sleep_while_running(&self, duration: Duration, running: &AtomicBool) {
        let mut remaining = duration;

        while remaining > Duration::ZERO && running.load(Ordering::Relaxed) {
            let slice = remaining.min(BACKOFF_SLICE);
            self.clock.sleep(slice);
            remaining -= slice;
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::gps::GpsFix;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::thread;
    use std::time::Instant;
    use util::time::SimClock;

    const GGA: &str = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47";
    const GGA_SW: &str =
        "$GPGGA,092750.500,5321.6802,S,00630.3372,W,1,8,1.03,61.7,M,55.2,M,,*6E";

    /// Port which yields its lines then reports a disconnect.
    struct ScriptedPort {
        lines: VecDeque<Option<String>>,
    }

    impl NmeaPort for ScriptedPort {
        fn read_line(&mut self) -> Result<Option<String>, GpsError> {
            self.lines.pop_front().ok_or(GpsError::Disconnected)
        }
    }

    /// Each attempt either fails to open (`None`) or opens a port with the given lines.
    /// Once the script is used up every open fails.
    struct ScriptedOpener {
        attempts: Arc<Mutex<VecDeque<Option<Vec<Option<String>>>>>>,
        num_opens: Arc<Mutex<u32>>,
    }

    impl NmeaPortOpener for ScriptedOpener {
        fn open(&mut self) -> Result<Box<dyn NmeaPort>, GpsError> {
            *self.num_opens.lock().unwrap() += 1;

            match self.attempts.lock().unwrap().pop_front() {
                Some(Some(lines)) => Ok(Box::new(ScriptedPort {
                    lines: lines.into(),
                })),
                _ => Err(GpsError::Disconnected),
            }
        }
    }

    fn line(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    fn setup(
        attempts: Vec<Option<Vec<Option<String>>>>,
        params: GpsParams,
    ) -> (GpsIngestor, Arc<GpsStore>, Arc<SimClock>, Arc<Mutex<u32>>) {
        let num_opens = Arc::new(Mutex::new(0));
        let opener = ScriptedOpener {
            attempts: Arc::new(Mutex::new(attempts.into())),
            num_opens: num_opens.clone(),
        };
        let store = Arc::new(GpsStore::new());
        let clock = Arc::new(SimClock::new());
        let ingestor = GpsIngestor::new(Box::new(opener), store.clone(), clock.clone(), &params);

        (ingestor, store, clock, num_opens)
    }

    #[test]
    fn test_ingest_keeps_previous_fix() {
        let (ingestor, store, _, _) = setup(vec![], GpsParams::default());
        assert!(store.latest().is_empty());

        ingestor.ingest_line(GGA).unwrap();
        let fix = store.latest();
        assert_eq!(fix.timestamp.as_deref(), Some("12:35:19"));

        assert!(ingestor.ingest_line(&GGA.replace("*47", "*00")).is_err());
        assert!(ingestor.ingest_line("$GPGGA,,,,").is_err());
        assert_eq!(store.latest(), fix);

        ingestor.ingest_line(GGA_SW).unwrap();
        assert_ne!(store.latest(), fix);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let (ingestor, _, _, _) = setup(vec![], GpsParams::default());

        assert_eq!(ingestor.backoff(1), Duration::from_secs(5));
        assert_eq!(ingestor.backoff(2), Duration::from_secs(10));
        assert_eq!(ingestor.backoff(3), Duration::from_secs(20));
        assert_eq!(ingestor.backoff(4), Duration::from_secs(40));
        assert_eq!(ingestor.backoff(5), Duration::from_secs(60));
        assert_eq!(ingestor.backoff(1000), Duration::from_secs(60));
    }

    #[test]
    fn test_gives_up_after_max_retries() {
        let params = GpsParams {
            max_retries: Some(3),
            ..Default::default()
        };
        let (ingestor, store, clock, num_opens) = setup(vec![], params);

        let exit = ingestor.run(Arc::new(AtomicBool::new(true)));

        assert_eq!(exit, IngestExit::RetriesExhausted);
        assert_eq!(*num_opens.lock().unwrap(), 4);
        assert_eq!(clock.elapsed(), Duration::from_secs(5 + 10 + 20));
        assert!(clock.sleeps().iter().all(|s| *s <= BACKOFF_SLICE));
        assert!(store.latest().is_empty());
    }

    #[test]
    fn test_reconnects_after_disconnect() {
        let params = GpsParams {
            max_retries: Some(1),
            ..Default::default()
        };
        let (ingestor, store, clock, num_opens) = setup(
            vec![
                None,
                Some(vec![line(GGA), None, line("$GPGGA,bad*00")]),
                Some(vec![line("$GPGSV,1,1,00*79"), line(GGA_SW)]),
            ],
            params,
        );

        let exit = ingestor.run(Arc::new(AtomicBool::new(true)));

        // Fail, open, disconnect, open, disconnect, fail, give up
        assert_eq!(exit, IngestExit::RetriesExhausted);
        assert_eq!(*num_opens.lock().unwrap(), 4);
        assert_eq!(store.latest().latitude.as_deref(), Some("53.361337 S"));

        // Every successful open resets the backoff, so each wait is the initial one.
        // Five lines are read at 200 ms each.
        assert_eq!(
            clock.elapsed(),
            Duration::from_secs(5 * 3) + Duration::from_millis(200 * 5)
        );
    }

    #[test]
    fn test_run_stops_when_cleared() {
        // Port that never produces anything
        let lines = vec![None; 10_000];
        let (ingestor, store, _, _) = setup(vec![Some(lines)], GpsParams::default());

        let running = Arc::new(AtomicBool::new(true));
        let r = running.clone();
        let handle = thread::spawn(move || ingestor.run(r));

        let start = Instant::now();
        thread::sleep(Duration::from_millis(20));
        running.store(false, Ordering::Relaxed);

        assert_eq!(handle.join().unwrap(), IngestExit::Stopped);
        assert!(start.elapsed() < Duration::from_secs(5));
        assert_eq!(store.latest(), GpsFix::default());
    }
}
