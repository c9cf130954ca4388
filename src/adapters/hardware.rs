//! Hardware adapter: bridges the H-bridge driver to [`ActuatorPort`].
//!
//! This is the only place where the control core meets real pins.  Any
//! `embedded-hal` PWM channel and pair of output pins will do.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

use crate::app::ports::ActuatorPort;
use crate::drivers::motor::{Direction, MotorDriver, MotorState};
use crate::error::ActuatorError;

pub struct MotorAdapter<PWM, IN1, IN2> {
    motor: MotorDriver<PWM, IN1, IN2>,
}

impl<PWM, IN1, IN2> MotorAdapter<PWM, IN1, IN2>
where
    PWM: SetDutyCycle,
    IN1: OutputPin,
    IN2: OutputPin,
{
    pub fn new(motor: MotorDriver<PWM, IN1, IN2>) -> Self {
        Self { motor }
    }

    pub fn state(&self) -> MotorState {
        self.motor.state()
    }

    pub fn into_inner(self) -> MotorDriver<PWM, IN1, IN2> {
        self.motor
    }
}

impl<PWM, IN1, IN2> ActuatorPort for MotorAdapter<PWM, IN1, IN2>
where
    PWM: SetDutyCycle,
    IN1: OutputPin,
    IN2: OutputPin,
{
    fn set_duty_cycle(&mut self, n: u16, period: u16) -> Result<(), ActuatorError> {
        if n == 0 {
            return self.motor.stop();
        }
        self.motor.set_duty_cycle(n, period)
    }

    fn set_direction(&mut self, forward: bool) -> Result<(), ActuatorError> {
        let dir = if forward {
            Direction::Forward
        } else {
            Direction::Reverse
        };
        self.motor.set_direction(dir)
    }
}
