//! # GPIO motor driver
//!
//! Drives an L298N dual H-bridge directly from the Raspberry Pi header: software PWM on the two
//! enable pins and plain outputs on the four direction pins.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, info};
use rppal::gpio::{Gpio, OutputPin};

use super::{ElecDriverError, ElecDriverParams, MotorDriver};
use crate::drive_ctrl::{DriveIntent, TrackDemand};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct GpioDriver {
    pwm_freq_hz: f64,

    left: Channel,
    right: Channel,

    released: bool,
}

/// One H-bridge channel.
struct Channel {
    enable: OutputPin,
    dir_a: OutputPin,
    dir_b: OutputPin,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl GpioDriver {
    /// Claim the pins and start PWM on both enables at 0% duty.
    ///
    /// The pins return to their previous state when the driver is dropped.
    pub fn new(params: &ElecDriverParams) -> Result<Self, ElecDriverError> {
        let gpio = Gpio::new()?;

        let output = |pin: u8| -> Result<OutputPin, ElecDriverError> {
            let mut p = gpio.get(pin)?.into_output();
            p.set_low();
            Ok(p)
        };

        let mut driver = Self {
            pwm_freq_hz: params.pwm_freq_hz,
            left: Channel {
                enable: output(params.ena_pin)?,
                dir_a: output(params.in1_pin)?,
                dir_b: output(params.in2_pin)?,
            },
            right: Channel {
                enable: output(params.enb_pin)?,
                dir_a: output(params.in3_pin)?,
                dir_b: output(params.in4_pin)?,
            },
            released: false,
        };

        driver.apply(&DriveIntent::stop())?;

        info!(
            "GPIO motor driver initialised (PWM {} Hz on pins {} and {})",
            params.pwm_freq_hz, params.ena_pin, params.enb_pin
        );

        Ok(driver)
    }
}

impl MotorDriver for GpioDriver {
    fn apply(&mut self, intent: &DriveIntent) -> Result<(), ElecDriverError> {
        if self.released {
            return Err(ElecDriverError::Released);
        }

        self.left.set(&intent.left, self.pwm_freq_hz)?;
        self.right.set(&intent.right, self.pwm_freq_hz)?;

        Ok(())
    }

    fn release(&mut self) -> Result<(), ElecDriverError> {
        if self.released {
            return Ok(());
        }

        for ch in [&mut self.left, &mut self.right].iter_mut() {
            ch.enable.clear_pwm()?;
            ch.enable.set_low();
            ch.dir_a.set_low();
            ch.dir_b.set_low();
        }
        self.released = true;

        debug!("GPIO motor driver released");

        Ok(())
    }
}

impl Channel {
    fn set(&mut self, demand: &TrackDemand, pwm_freq_hz: f64) -> Result<(), ElecDriverError> {
        self.enable
            .set_pwm_frequency(pwm_freq_hz, demand.duty_cycle_pct / 100.0)?;

        let (a, b) = demand.dir.pin_levels();
        set_level(&mut self.dir_a, a);
        set_level(&mut self.dir_b, b);

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn set_level(pin: &mut OutputPin, high: bool) {
    if high {
        pin.set_high()
    } else {
        pin.set_low()
    }
}
