//! Simulated camera

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use super::{CamDevice, CamError, CamOpener, PixelOrder, RawFrame};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Opens simulated cameras producing a moving test pattern in BGR order.
pub struct SimCamOpener {
    width: u32,
    height: u32,
    state: SimCamState,
}

/// Shared handle used to control and observe a [`SimCamOpener`] and its devices.
#[derive(Debug, Clone, Default)]
pub struct SimCamState {
    available: Arc<AtomicBool>,
    failing_opens: Arc<AtomicUsize>,
    failing_captures: Arc<AtomicUsize>,
    num_opens: Arc<AtomicUsize>,
    num_frames: Arc<AtomicUsize>,
    num_stops: Arc<AtomicUsize>,
}

struct SimCamDevice {
    width: u32,
    height: u32,
    state: SimCamState,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimCamOpener {
    pub fn new(width: u32, height: u32, available: bool) -> Self {
        let state = SimCamState::default();
        state.set_available(available);

        Self {
            width,
            height,
            state,
        }
    }

    pub fn state(&self) -> SimCamState {
        self.state.clone()
    }
}

impl CamOpener for SimCamOpener {
    fn open(&self) -> Result<Box<dyn CamDevice>, CamError> {
        self.state.num_opens.fetch_add(1, Ordering::SeqCst);

        if !self.state.available.load(Ordering::SeqCst) || take_one(&self.state.failing_opens) {
            return Err(CamError::Unavailable("simulated camera not present".into()));
        }

        Ok(Box::new(SimCamDevice {
            width: self.width,
            height: self.height,
            state: self.state.clone(),
        }))
    }
}

impl SimCamState {
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Make the next `n` opens fail.
    pub fn fail_next_opens(&self, n: usize) {
        self.failing_opens.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` captures fail.
    pub fn fail_next_captures(&self, n: usize) {
        self.failing_captures.store(n, Ordering::SeqCst);
    }

    pub fn num_opens(&self) -> usize {
        self.num_opens.load(Ordering::SeqCst)
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames.load(Ordering::SeqCst)
    }

    pub fn num_stops(&self) -> usize {
        self.num_stops.load(Ordering::SeqCst)
    }
}

impl CamDevice for SimCamDevice {
    fn capture(&mut self) -> Result<RawFrame, CamError> {
        if take_one(&self.state.failing_captures) {
            return Err(CamError::Capture("simulated capture failure".into()));
        }

        let index = self.state.num_frames.fetch_add(1, Ordering::SeqCst);

        // Vertical bar, 8 pixels wide, sweeping across a dark background
        let columns = (self.width as usize + 7) / 8;
        let bar = index % columns.max(1);
        let mut data = Vec::with_capacity((self.width * self.height * 3) as usize);
        for _ in 0..self.height {
            for x in 0..self.width as usize {
                match x / 8 == bar {
                    true => data.extend_from_slice(&[255, 255, 255]),
                    false => data.extend_from_slice(&[64, 32, 16]),
                }
            }
        }

        Ok(RawFrame::Pixels {
            width: self.width,
            height: self.height,
            order: PixelOrder::Bgr,
            data,
        })
    }

    fn stop(&mut self) {
        self.state.num_stops.fetch_add(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Decrement the counter if it's non-zero, returning true if it was.
fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn pixel(frame: &RawFrame, x: usize) -> &[u8] {
        match frame {
            RawFrame::Pixels { data, .. } => &data[x * 3..x * 3 + 3],
            RawFrame::Mjpeg(_) => panic!("expected raw pixels"),
        }
    }

    #[test]
    fn test_bar_sweeps_after_many_frames() {
        let opener = SimCamOpener::new(32, 2, true);
        let state = opener.state();
        let mut device = opener.open().unwrap();

        state.num_frames.store(usize::MAX - 1, Ordering::SeqCst);

        // Four bar positions across 32 pixels, usize::MAX - 1 lands on the third
        let frame = device.capture().unwrap();
        assert_eq!(pixel(&frame, 16), &[255, 255, 255]);
        assert_eq!(pixel(&frame, 0), &[64, 32, 16]);

        let frame = device.capture().unwrap();
        assert_eq!(pixel(&frame, 24), &[255, 255, 255]);
        assert_eq!(pixel(&frame, 16), &[64, 32, 16]);
        assert_eq!(state.num_frames(), 0);
    }
}
