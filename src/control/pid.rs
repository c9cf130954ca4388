//! PID speed controller with feed-forward.
//!
//! `N = kP·e + kF + kI·∫e + kD·de/dt`, with `e = target - measured` in
//! RPM.  With the default gains (`kI = kD = 0`) this is the plain
//! proportional-plus-offset law.
//!
//! A zero target, or any non-positive output, is a hard stop: `N = 0`
//! and the integrator is cleared.

use super::{ControlState, ControlStrategy};
use crate::config::ControllerConfig;

pub struct PidController {
    kp: f32,
    kf: f32,
    ki: f32,
    kd: f32,
    dt: f32,
    integral: f32,
    prev_error: f32,
    output_max: f32,
}

impl PidController {
    pub fn new(kp: f32, kf: f32, ki: f32, kd: f32, dt: f32, pwm_period: u16) -> Self {
        Self {
            kp,
            kf,
            ki,
            kd,
            dt,
            integral: 0.0,
            prev_error: 0.0,
            output_max: f32::from(pwm_period),
        }
    }

    pub fn from_config(config: &ControllerConfig) -> Self {
        Self::new(
            config.kp,
            config.kf,
            config.ki,
            config.kd,
            config.control_period_ms as f32 / 1000.0,
            config.pwm_period,
        )
    }

    /// Compute the command for one error sample.
    pub fn compute(&mut self, target: u16, error: i32) -> u16 {
        if target == 0 {
            self.reset();
            return 0;
        }

        let error = error as f32;

        // Proportional + feed-forward
        let p = self.kp * error + self.kf;

        // Integral
        self.integral += error * self.dt;
        let i = self.ki * self.integral;

        // Derivative
        let derivative = if self.dt > 0.0 {
            (error - self.prev_error) / self.dt
        } else {
            0.0
        };
        let d = self.kd * derivative;

        self.prev_error = error;

        let raw = p + i + d;
        if raw.is_nan() || raw <= 0.0 {
            self.integral -= error * self.dt;
            return 0;
        }

        let output = raw.min(self.output_max);

        // Anti-windup: stop integrating while saturated
        if output >= self.output_max {
            self.integral -= error * self.dt;
        }

        output as u16
    }

    pub fn integral(&self) -> f32 {
        self.integral
    }
}

impl ControlStrategy for PidController {
    fn command(&mut self, state: &mut ControlState) -> u16 {
        self.compute(state.target, state.error)
    }

    fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
    }
}
