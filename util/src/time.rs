//! General time utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::Mutex;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A source of time which background loops use for pacing and backoff.
///
/// Loops take an `Arc<dyn Clock>` so that tests can substitute a [`SimClock`]
/// and check timing behaviour without actually waiting.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> Instant;

    /// Block the calling thread for the given duration.
    fn sleep(&self, duration: Duration);
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Wall clock backed by `std::time` and `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

/// A simulated clock which never blocks.
///
/// Each call to `sleep` advances the simulated time and is recorded so that
/// the sequence of requested sleeps can be inspected.
#[derive(Debug)]
pub struct SimClock {
    epoch: Instant,
    inner: Mutex<SimClockInner>
}

#[derive(Debug, Default)]
struct SimClockInner {
    elapsed: Duration,
    sleeps: Vec<Duration>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration)
    }
}

impl SimClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            inner: Mutex::new(SimClockInner::default())
        }
    }

    /// Total simulated time elapsed since the clock was created.
    pub fn elapsed(&self) -> Duration {
        self.lock().elapsed
    }

    /// All sleeps requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.lock().sleeps.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimClockInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SimClock {
    fn now(&self) -> Instant {
        self.epoch + self.lock().elapsed
    }

    fn sleep(&self, duration: Duration) {
        {
            let mut inner = self.lock();
            inner.elapsed += duration;
            inner.sleeps.push(duration);
        }

        // Give other threads a chance to run, a simulated sleep otherwise
        // turns every loop into a busy spin.
        std::thread::yield_now();
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_duration_to_seconds() {
        assert_eq!(
            duration_to_seconds(chrono::Duration::milliseconds(1500)),
            Some(1.5)
        );
        assert_eq!(duration_to_seconds(chrono::Duration::max_value()), None);
    }

    #[test]
    fn test_sim_clock() {
        let clock = SimClock::new();
        let start = clock.now();

        clock.sleep(Duration::from_millis(200));
        clock.sleep(Duration::from_secs(5));

        assert_eq!(clock.now() - start, Duration::from_millis(5200));
        assert_eq!(clock.elapsed(), Duration::from_millis(5200));
        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_millis(200), Duration::from_secs(5)]
        );
    }
}
