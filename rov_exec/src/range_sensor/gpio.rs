//! Raspberry Pi pins for the range sensor

use rppal::gpio::{Gpio, InputPin, OutputPin};

use super::{EchoPin, RangeSensor, RangeSensorParams, TriggerPin};
use crate::elec_driver::ElecDriverError;

impl TriggerPin for OutputPin {
    fn set_high(&mut self) {
        OutputPin::set_high(self)
    }

    fn set_low(&mut self) {
        OutputPin::set_low(self)
    }
}

impl EchoPin for InputPin {
    fn is_high(&self) -> bool {
        InputPin::is_high(self)
    }
}

/// Claim the trigger and echo pins. They are returned to their previous state on drop.
pub fn open(params: &RangeSensorParams) -> Result<RangeSensor<OutputPin, InputPin>, ElecDriverError> {
    let gpio = Gpio::new()?;

    let mut trigger = gpio.get(params.trigger_pin)?.into_output();
    trigger.set_low();
    let echo = gpio.get(params.echo_pin)?.into_input();

    Ok(RangeSensor::new(trigger, echo, params))
}
