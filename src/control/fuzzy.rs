//! Fuzzy-logic speed controller.
//!
//! Each update runs the classic four stages:
//!
//! 1. crisp inputs: `error = target - measured`, `derivative = measured - previous`
//! 2. fuzzification into three error and three trend memberships
//! 3. rule evaluation into `same`, `decrease`, `increase`
//! 4. centroid defuzzification into an output step `delta ∈ [-TN, TN]`
//!
//! The step is integrated into an internal level in `[0, 255]` which is
//! scaled onto the PWM period, so the command can never leave
//! `[0, pwm_period]`.

use super::membership::{DerivativeMemberships, ErrorMemberships, Membership};
use super::{ControlState, ControlStrategy};
use crate::config::ControllerConfig;

/// Highest internal output level.
pub const LEVEL_MAX: u8 = 255;

/// Rule-stage outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleOutputs {
    pub same: Membership,
    pub decrease: Membership,
    pub increase: Membership,
}

impl RuleOutputs {
    pub fn evaluate(e: &ErrorMemberships, d: &DerivativeMemberships) -> Self {
        let same = e.ok.and(d.steady);
        let decrease = e
            .ok
            .and(d.increasing)
            .or(e.high.and(d.steady))
            .or(e.high.and(d.increasing));
        let increase = e
            .ok
            .and(d.decreasing)
            .or(e.low.and(d.steady))
            .or(e.low.and(d.decreasing));
        Self {
            same,
            decrease,
            increase,
        }
    }

    /// `step * (increase - decrease) / (decrease + same + increase)`,
    /// or 0 when no rule fired.
    pub fn defuzzify(&self, step: i32) -> i32 {
        let increase = i32::from(self.increase);
        let decrease = i32::from(self.decrease);
        let total = decrease + i32::from(self.same) + increase;
        if total == 0 {
            return 0;
        }
        // |increase - decrease| <= total, so the quotient is within ±step.
        (i64::from(step) * i64::from(increase - decrease) / i64::from(total)) as i32
    }
}

/// Everything one inference pass produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Inference {
    pub error: ErrorMemberships,
    pub derivative: DerivativeMemberships,
    pub rules: RuleOutputs,
    pub delta: i32,
}

pub struct FuzzyController {
    error_threshold: i32,
    derivative_threshold: i32,
    step: i32,
    pwm_period: u16,
    level: u8,
    rules: RuleOutputs,
}

impl FuzzyController {
    pub fn new(error_threshold: i32, derivative_threshold: i32, step: i32, pwm_period: u16) -> Self {
        Self {
            error_threshold,
            derivative_threshold,
            step,
            pwm_period,
            level: 0,
            rules: RuleOutputs::default(),
        }
    }

    pub fn from_config(config: &ControllerConfig) -> Self {
        Self::new(
            config.fuzzy_error_threshold,
            config.fuzzy_derivative_threshold,
            config.fuzzy_step,
            config.pwm_period,
        )
    }

    /// Output step for one pair of crisp inputs.  Pure; does not touch
    /// the level.
    pub fn infer(&self, error: i32, derivative: i32) -> Inference {
        let e = ErrorMemberships::fuzzify(error, self.error_threshold);
        let d = DerivativeMemberships::fuzzify(derivative, self.derivative_threshold);
        let rules = RuleOutputs::evaluate(&e, &d);
        Inference {
            error: e,
            derivative: d,
            rules,
            delta: rules.defuzzify(self.step),
        }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn rules(&self) -> RuleOutputs {
        self.rules
    }

    fn scaled(&self) -> u16 {
        (u32::from(self.level) * u32::from(self.pwm_period) / u32::from(LEVEL_MAX)) as u16
    }
}

impl ControlStrategy for FuzzyController {
    fn command(&mut self, state: &mut ControlState) -> u16 {
        let inference = self.infer(state.error, state.derivative);
        state.error_degrees = inference.error;
        state.derivative_degrees = inference.derivative;
        self.rules = inference.rules;

        let level = i32::from(self.level)
            .saturating_add(inference.delta)
            .clamp(0, i32::from(LEVEL_MAX));
        self.level = level as u8;
        self.scaled()
    }

    fn reset(&mut self) {
        self.level = 0;
        self.rules = RuleOutputs::default();
    }
}
