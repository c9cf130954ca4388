//! DC motor driver (H-bridge with two direction inputs).
//!
//! Variable-speed forward/reverse control via one PWM channel and two
//! direction GPIOs (IN1/IN2).  The direction lines are mutually
//! exclusive: the inactive line is always cleared before the active one
//! is asserted, so the bridge never sees both high.
//!
//! ## Safety contract
//!
//! This driver is a dumb actuator.  It performs **no clamping**: a duty
//! above the period is rejected with [`ActuatorError::DutyOutOfRange`].
//! Bounding the command is the control law's job.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

use crate::error::ActuatorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorState {
    Stopped,
    Running { duty: u16, period: u16, dir: Direction },
}

pub struct MotorDriver<PWM, IN1, IN2> {
    pwm: PWM,
    in1: IN1,
    in2: IN2,
    state: MotorState,
    direction: Direction,
}

impl<PWM, IN1, IN2> MotorDriver<PWM, IN1, IN2>
where
    PWM: SetDutyCycle,
    IN1: OutputPin,
    IN2: OutputPin,
{
    /// Take the channel and lines, start stopped and facing forward.
    pub fn new(pwm: PWM, in1: IN1, in2: IN2) -> Result<Self, ActuatorError> {
        let mut motor = Self {
            pwm,
            in1,
            in2,
            state: MotorState::Stopped,
            direction: Direction::Forward,
        };
        motor.pwm
            .set_duty_cycle_fully_off()
            .map_err(|_| ActuatorError::PwmWriteFailed)?;
        motor.set_direction(Direction::Forward)?;
        Ok(motor)
    }

    /// Set the compare value to `duty` out of `period` duty units.
    pub fn set_duty_cycle(&mut self, duty: u16, period: u16) -> Result<(), ActuatorError> {
        if period == 0 || duty > period {
            return Err(ActuatorError::DutyOutOfRange);
        }

        self.pwm
            .set_duty_cycle_fraction(duty, period)
            .map_err(|_| ActuatorError::PwmWriteFailed)?;

        self.state = if duty == 0 {
            MotorState::Stopped
        } else {
            MotorState::Running {
                duty,
                period,
                dir: self.direction,
            }
        };
        Ok(())
    }

    pub fn set_direction(&mut self, dir: Direction) -> Result<(), ActuatorError> {
        let result = match dir {
            Direction::Forward => self
                .in2
                .set_low()
                .map_err(|_| ActuatorError::DirectionWriteFailed)
                .and_then(|()| {
                    self.in1
                        .set_high()
                        .map_err(|_| ActuatorError::DirectionWriteFailed)
                }),
            Direction::Reverse => self
                .in1
                .set_low()
                .map_err(|_| ActuatorError::DirectionWriteFailed)
                .and_then(|()| {
                    self.in2
                        .set_high()
                        .map_err(|_| ActuatorError::DirectionWriteFailed)
                }),
        };
        result?;
        self.direction = dir;
        if let MotorState::Running { duty, period, .. } = self.state {
            self.state = MotorState::Running { duty, period, dir };
        }
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), ActuatorError> {
        self.pwm
            .set_duty_cycle_fully_off()
            .map_err(|_| ActuatorError::PwmWriteFailed)?;
        self.state = MotorState::Stopped;
        Ok(())
    }

    pub fn state(&self) -> MotorState {
        self.state
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_running(&self) -> bool {
        !matches!(self.state, MotorState::Stopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;
    use core::convert::Infallible;
    use std::rc::Rc;

    use embedded_hal::digital::ErrorType as PinErrorType;
    use embedded_hal::pwm::ErrorType as PwmErrorType;

    struct Pwm(Rc<RefCell<u16>>);

    impl PwmErrorType for Pwm {
        type Error = Infallible;
    }

    impl SetDutyCycle for Pwm {
        fn max_duty_cycle(&self) -> u16 {
            1000
        }

        fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
            *self.0.borrow_mut() = duty;
            Ok(())
        }
    }

    /// Records every level written, to catch both lines high at once.
    struct Line {
        id: usize,
        levels: Rc<RefCell<[bool; 2]>>,
        overlap: Rc<RefCell<bool>>,
    }

    impl PinErrorType for Line {
        type Error = Infallible;
    }

    impl OutputPin for Line {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.levels.borrow_mut()[self.id] = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            let mut levels = self.levels.borrow_mut();
            levels[self.id] = true;
            if levels[0] && levels[1] {
                *self.overlap.borrow_mut() = true;
            }
            Ok(())
        }
    }

    fn motor() -> (
        MotorDriver<Pwm, Line, Line>,
        Rc<RefCell<u16>>,
        Rc<RefCell<[bool; 2]>>,
        Rc<RefCell<bool>>,
    ) {
        let duty = Rc::new(RefCell::new(0));
        let levels = Rc::new(RefCell::new([false; 2]));
        let overlap = Rc::new(RefCell::new(false));
        let line = |id| Line {
            id,
            levels: levels.clone(),
            overlap: overlap.clone(),
        };
        let m = MotorDriver::new(Pwm(duty.clone()), line(0), line(1)).unwrap();
        (m, duty, levels, overlap)
    }

    #[test]
    fn duty_is_scaled_to_channel_range() {
        let (mut m, duty, _, _) = motor();
        m.set_duty_cycle(1250, 2500).unwrap();
        assert_eq!(*duty.borrow(), 500);
        assert!(m.is_running());
        m.set_duty_cycle(2500, 2500).unwrap();
        assert_eq!(*duty.borrow(), 1000);
    }

    #[test]
    fn duty_above_period_is_rejected_not_clamped() {
        let (mut m, duty, _, _) = motor();
        m.set_duty_cycle(100, 2500).unwrap();
        assert_eq!(
            m.set_duty_cycle(2501, 2500),
            Err(ActuatorError::DutyOutOfRange)
        );
        assert_eq!(*duty.borrow(), 40);
    }

    #[test]
    fn direction_lines_never_overlap() {
        let (mut m, _, levels, overlap) = motor();
        assert_eq!(*levels.borrow(), [true, false]);
        m.set_direction(Direction::Reverse).unwrap();
        assert_eq!(*levels.borrow(), [false, true]);
        m.set_direction(Direction::Forward).unwrap();
        assert_eq!(*levels.borrow(), [true, false]);
        assert!(!*overlap.borrow());
    }

    #[test]
    fn zero_duty_reports_stopped() {
        let (mut m, _, _, _) = motor();
        m.set_duty_cycle(500, 2500).unwrap();
        m.set_duty_cycle(0, 2500).unwrap();
        assert_eq!(m.state(), MotorState::Stopped);
    }
}
