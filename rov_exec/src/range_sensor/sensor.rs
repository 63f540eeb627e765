//! Ping/echo measurement

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use std::thread;
use std::time::{Duration, Instant};

use super::{
    DistanceSource, EchoPin, RangeSample, RangeSensorParams, TriggerPin, HALF_SPEED_OF_SOUND_CM_S,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An ultrasonic sensor wired to a trigger and an echo pin.
pub struct RangeSensor<T, E> {
    trigger: T,
    echo: E,

    settle: Duration,
    pulse: Duration,
    echo_timeout: Duration,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<T, E> RangeSensor<T, E>
where
    T: TriggerPin,
    E: EchoPin,
{
    pub fn new(trigger: T, echo: E, params: &RangeSensorParams) -> Self {
        Self {
            trigger,
            echo,
            settle: Duration::from_micros(params.settle_us),
            pulse: Duration::from_micros(params.pulse_us),
            echo_timeout: Duration::from_millis(params.echo_timeout_ms),
        }
    }

    /// Ping and wait for the echo.
    ///
    /// Blocks for at most twice the echo timeout plus the trigger pulse.
    pub fn ping(&mut self) -> RangeSample {
        self.trigger.set_low();
        thread::sleep(self.settle);
        self.trigger.set_high();
        thread::sleep(self.pulse);
        self.trigger.set_low();

        let rise = match self.wait_for(true) {
            Some(t) => t,
            None => {
                trace!("Timed out waiting for the echo to start");
                return RangeSample::Timeout;
            }
        };

        let fall = match self.wait_for(false) {
            Some(t) => t,
            None => {
                trace!("Timed out waiting for the echo to end");
                return RangeSample::Timeout;
            }
        };

        RangeSample::Distance(echo_to_cm(fall - rise))
    }

    /// Spin until the echo pin reaches `high`, returning the instant it did.
    fn wait_for(&self, high: bool) -> Option<Instant> {
        let start = Instant::now();

        loop {
            let now = Instant::now();
            if self.echo.is_high() == high {
                return Some(now);
            }
            if now - start > self.echo_timeout {
                return None;
            }
            std::hint::spin_loop();
        }
    }
}

impl<T, E> DistanceSource for RangeSensor<T, E>
where
    T: TriggerPin,
    E: EchoPin,
{
    fn measure(&mut self) -> RangeSample {
        self.ping()
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert the duration the echo was high into a distance, rounded to 2 decimal places.
pub fn echo_to_cm(high_duration: Duration) -> f64 {
    let cm = high_duration.as_secs_f64() * HALF_SPEED_OF_SOUND_CM_S;
    (cm * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Trigger which records when it was last released.
    #[derive(Clone, Default)]
    struct TestTrigger {
        fired_at: Arc<Mutex<Option<Instant>>>,
        pulses: Arc<Mutex<u32>>,
    }

    impl TriggerPin for TestTrigger {
        fn set_high(&mut self) {
            *self.pulses.lock().unwrap() += 1;
        }

        fn set_low(&mut self) {
            *self.fired_at.lock().unwrap() = Some(Instant::now());
        }
    }

    /// Echo pin with a scripted level over time, relative to the trigger.
    struct TestEcho {
        trigger: TestTrigger,
        profile: EchoProfile,
    }

    enum EchoProfile {
        StuckLow,
        StuckHigh,
        /// Goes high after the first delay and low again after the second
        Pulse(Duration, Duration),
    }

    impl EchoPin for TestEcho {
        fn is_high(&self) -> bool {
            match self.profile {
                EchoProfile::StuckLow => false,
                EchoProfile::StuckHigh => true,
                EchoProfile::Pulse(start, end) => {
                    let fired = match *self.trigger.fired_at.lock().unwrap() {
                        Some(t) => t,
                        None => return false,
                    };
                    let since = fired.elapsed();
                    since >= start && since < end
                }
            }
        }
    }

    fn sensor(profile: EchoProfile) -> (RangeSensor<TestTrigger, TestEcho>, TestTrigger) {
        let trigger = TestTrigger::default();
        let echo = TestEcho {
            trigger: trigger.clone(),
            profile,
        };
        (
            RangeSensor::new(trigger.clone(), echo, &RangeSensorParams::default()),
            trigger,
        )
    }

    #[test]
    fn test_echo_to_cm() {
        // 1 ms round trip is 17.15 cm
        assert_eq!(echo_to_cm(Duration::from_millis(1)), 17.15);
        assert_eq!(echo_to_cm(Duration::from_micros(583)), 10.0);
        assert_eq!(echo_to_cm(Duration::from_secs(0)), 0.0);
    }

    #[test]
    fn test_measure_pulse() {
        let (mut sensor, trigger) = sensor(EchoProfile::Pulse(
            Duration::from_millis(1),
            Duration::from_millis(4),
        ));

        match sensor.measure() {
            // 3 ms high is 51.45 cm, allow for scheduling jitter
            RangeSample::Distance(d) => assert!(d > 40.0 && d < 80.0, "distance {}", d),
            RangeSample::Timeout => panic!("unexpected timeout"),
        }
        assert_eq!(*trigger.pulses.lock().unwrap(), 1);
    }

    #[test]
    fn test_stuck_low_times_out() {
        let (mut sensor, _) = sensor(EchoProfile::StuckLow);

        let start = Instant::now();
        assert_eq!(sensor.measure(), RangeSample::Timeout);
        assert!(start.elapsed() < Duration::from_millis(120));
    }

    #[test]
    fn test_stuck_high_times_out() {
        let (mut sensor, _) = sensor(EchoProfile::StuckHigh);

        let start = Instant::now();
        assert_eq!(sensor.measure(), RangeSample::Timeout);
        assert!(start.elapsed() < Duration::from_millis(120));
    }

    #[test]
    fn test_timeout_is_not_an_obstacle() {
        assert!(!RangeSample::Timeout.is_closer_than(30.0));
        assert!(RangeSample::Distance(29.99).is_closer_than(30.0));
        assert!(!RangeSample::Distance(30.0).is_closer_than(30.0));
    }
}
