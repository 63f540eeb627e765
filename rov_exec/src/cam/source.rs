//! Shared camera handle and the frame stream

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

// Internal
use super::{encode_frame, multipart_part, CamDevice, CamError, CamOpener, CamParams, RawFrame};
use util::time::Clock;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Owner of the camera handle.
///
/// The handle is created lazily, dropped after a failed capture so that it is
/// recreated on the next one, and stopped exactly once on shutdown.
pub struct CamSource {
    opener: Box<dyn CamOpener>,
    device: Mutex<Option<Box<dyn CamDevice>>>,
    closed: AtomicBool,
    clock: Arc<dyn Clock>,

    jpeg_quality: u8,
    frame_period: Duration,
    error_backoff: Duration,
    init_retry: Duration,
}

/// Endless stream of multipart frames, see [`CamSource::frames`].
pub struct Frames {
    source: Arc<CamSource>,

    /// Checked before and after every wait, the stream ends once it returns true
    cancelled: Option<Box<dyn Fn() -> bool + Send>>,

    /// An initialisation failure before the first frame is retried without waiting
    retry_now: bool,

    started: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CamSource {
    pub fn new(opener: Box<dyn CamOpener>, clock: Arc<dyn Clock>, params: &CamParams) -> Self {
        Self {
            opener,
            device: Mutex::new(None),
            closed: AtomicBool::new(false),
            clock,
            jpeg_quality: params.jpeg_quality,
            frame_period: Duration::from_millis(params.frame_period_ms),
            error_backoff: Duration::from_millis(params.error_backoff_ms),
            init_retry: Duration::from_millis(params.init_retry_ms),
        }
    }

    /// Acquire and start the camera if it isn't already.
    pub fn initialize(&self) -> Result<(), CamError> {
        let mut device = self.lock();
        self.init_locked(&mut device)
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Capture one raw frame, initialising the camera first if needed.
    pub fn capture(&self) -> Result<RawFrame, CamError> {
        let mut device = self.lock();
        self.init_locked(&mut device)?;

        let result = match device.as_mut() {
            Some(d) => d.capture(),
            None => Err(CamError::Unavailable("no camera handle".into())),
        };

        if result.is_err() {
            if let Some(mut d) = device.take() {
                d.stop();
            }
        }

        result
    }

    /// The stream of encoded frames, each framed as a multipart part.
    ///
    /// The stream never ends on its own, it only finishes once the source is shut down.
    pub fn frames(self: &Arc<Self>) -> Frames {
        Frames {
            source: self.clone(),
            cancelled: None,
            retry_now: true,
            started: false,
        }
    }

    /// Like [`CamSource::frames`], but the stream also ends once `cancelled`
    /// returns true, even while the camera is unavailable.
    pub fn frames_until<F>(self: &Arc<Self>, cancelled: F) -> Frames
    where
        F: Fn() -> bool + Send + 'static,
    {
        Frames {
            cancelled: Some(Box::new(cancelled)),
            ..self.frames()
        }
    }

    /// Stop the camera. Later calls have no effect.
    pub fn shutdown(&self) {
        let mut device = self.lock();
        self.closed.store(true, Ordering::SeqCst);

        if let Some(mut d) = device.take() {
            d.stop();
            info!("Camera stopped");
        }
    }

    fn init_locked(&self, device: &mut Option<Box<dyn CamDevice>>) -> Result<(), CamError> {
        if self.is_closed() {
            return Err(CamError::Closed);
        }
        if device.is_some() {
            return Ok(());
        }

        match self.opener.open() {
            Ok(d) => {
                info!("Camera initialised");
                *device = Some(d);
                Ok(())
            }
            Err(e) => {
                warn!("Camera initialisation failed: {}", e);
                Err(e)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Box<dyn CamDevice>>> {
        self.device.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Frames {
    fn should_stop(&self) -> bool {
        self.source.is_closed() || self.cancelled.as_ref().map_or(false, |c| c())
    }

    /// Wait unless the stream is over. Returns false once it is.
    fn pause(&self, duration: Duration) -> bool {
        if self.should_stop() {
            return false;
        }
        self.source.clock.sleep(duration);

        !self.should_stop()
    }
}

impl Iterator for Frames {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.started && !self.pause(self.source.frame_period) {
            return None;
        }
        self.started = true;

        loop {
            if self.should_stop() {
                return None;
            }

            let source = &self.source;

            // The device lock is released by the time the frame is encoded
            let wait = match source.capture() {
                Ok(raw) => match encode_frame(raw, source.jpeg_quality) {
                    Ok(jpeg) => {
                        self.retry_now = false;
                        return Some(multipart_part(&jpeg));
                    }
                    Err(e) => {
                        warn!("Could not encode frame: {}", e);
                        source.error_backoff
                    }
                },
                Err(CamError::Closed) => return None,
                Err(CamError::Unavailable(_)) => match std::mem::take(&mut self.retry_now) {
                    true => continue,
                    false => source.init_retry,
                },
                Err(e) => {
                    warn!("Camera capture failed: {}", e);
                    source.error_backoff
                }
            };

            if !self.pause(wait) {
                return None;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::cam::{SimCamOpener, SimCamState};
    use std::sync::mpsc;
    use std::thread;
    use util::time::SimClock;

    fn setup(available: bool) -> (Arc<CamSource>, SimCamState, Arc<SimClock>) {
        let opener = SimCamOpener::new(16, 8, available);
        let state = opener.state();
        let clock = Arc::new(SimClock::new());
        let source = Arc::new(CamSource::new(
            Box::new(opener),
            clock.clone(),
            &CamParams::default(),
        ));

        (source, state, clock)
    }

    fn is_jpeg_part(part: &[u8]) -> bool {
        let header = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n";
        part.starts_with(header)
            && part[header.len()..].starts_with(&[0xFF, 0xD8])
            && part.ends_with(b"\r\n")
    }

    #[test]
    fn test_frames_are_paced() {
        let (source, state, clock) = setup(true);
        source.initialize().unwrap();

        let parts: Vec<_> = source.frames().take(3).collect();

        assert!(parts.iter().all(|p| is_jpeg_part(p)));
        assert_eq!(state.num_frames(), 3);
        assert_eq!(state.num_opens(), 1);
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(50); 2]);
    }

    #[test]
    fn test_init_retry_pattern() {
        let (source, state, clock) = setup(true);
        state.fail_next_opens(3);

        assert!(source.initialize().is_err());

        // Immediate retry, then every 2 s until the camera comes up
        let part = source.frames().next().unwrap();

        assert!(is_jpeg_part(&part));
        assert_eq!(state.num_opens(), 4);
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(2); 1]);
        assert!(source.is_initialized());
    }

    #[test]
    fn test_capture_failure_reinitialises() {
        let (source, state, clock) = setup(true);
        source.initialize().unwrap();
        state.fail_next_captures(2);

        let part = source.frames().next().unwrap();

        assert!(is_jpeg_part(&part));
        assert_eq!(state.num_stops(), 2);
        assert_eq!(state.num_opens(), 3);
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(1); 2]);
    }

    #[test]
    fn test_reopen_failure_waits_after_streaming() {
        let (source, state, clock) = setup(true);
        let mut frames = source.frames();
        assert!(frames.next().is_some());

        state.fail_next_captures(1);
        state.fail_next_opens(1);
        assert!(frames.next().is_some());

        assert_eq!(state.num_opens(), 3);
        assert_eq!(
            clock.sleeps(),
            vec![
                Duration::from_millis(50),
                Duration::from_secs(1),
                Duration::from_secs(2)
            ]
        );
    }

    #[test]
    fn test_cancelled_while_unavailable() {
        let (source, state, _) = setup(false);
        let cancelled = Arc::new(AtomicBool::new(false));

        let flag = cancelled.clone();
        let s = source.clone();
        let handle = thread::spawn(move || {
            s.frames_until(move || flag.load(Ordering::SeqCst)).next()
        });

        thread::sleep(Duration::from_millis(20));
        assert!(state.num_opens() > 1);

        cancelled.store(true, Ordering::SeqCst);
        assert!(handle.join().unwrap().is_none());

        // No more attempts to open the camera once the stream has ended
        let opens = state.num_opens();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(state.num_opens(), opens);
        assert!(!source.is_closed());
    }

    #[test]
    fn test_camera_appears_later() {
        let (source, state, _) = setup(false);
        assert!(source.initialize().is_err());

        let (tx, rx) = mpsc::channel();
        let s = source.clone();
        let handle = thread::spawn(move || {
            for part in s.frames() {
                if tx.send(part).is_err() {
                    break;
                }
            }
        });

        thread::sleep(Duration::from_millis(20));
        assert!(rx.try_recv().is_err());

        state.set_available(true);
        let part = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(is_jpeg_part(&part));

        source.shutdown();
        drop(rx);
        handle.join().unwrap();
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let (source, state, _) = setup(true);
        source.initialize().unwrap();

        source.shutdown();
        source.shutdown();

        assert_eq!(state.num_stops(), 1);
        assert!(source.is_closed());
        assert!(!source.is_initialized());
        assert!(matches!(source.initialize(), Err(CamError::Closed)));
        assert!(source.frames().next().is_none());
        assert_eq!(state.num_opens(), 1);
    }
}
