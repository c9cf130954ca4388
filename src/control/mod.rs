//! Closed-loop speed control.
//!
//! [`ControlLoop`] owns the [`ControlState`] and the selected strategy.
//! Each update derives the crisp inputs from the new measurement, asks
//! the strategy for a command and bounds it to `[0, pwm_period]` before
//! anything reaches the actuator.

pub mod fuzzy;
pub mod membership;
pub mod pid;

use serde::{Deserialize, Serialize};

use crate::config::ControllerConfig;
use fuzzy::FuzzyController;
use membership::{DerivativeMemberships, ErrorMemberships};
use pid::PidController;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyKind {
    Fuzzy,
    Pid,
}

/// Everything the control thread knows about the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlState {
    /// Operator-set speed (RPM).
    pub target: u16,
    /// Latest speed estimate (RPM).
    pub measured: u16,
    /// Estimate from the previous iteration.
    pub previous: u16,
    /// `target - measured`
    pub error: i32,
    /// `measured - previous`
    pub derivative: i32,
    pub error_degrees: ErrorMemberships,
    pub derivative_degrees: DerivativeMemberships,
    /// Duty-cycle command `N`.
    pub command: u16,
}

/// A control law producing a duty command from the current state.
pub trait ControlStrategy {
    /// Produce `N`.  May record intermediate values in `state`.
    fn command(&mut self, state: &mut ControlState) -> u16;

    /// Forget accumulated history.
    fn reset(&mut self);
}

pub enum Strategy {
    Fuzzy(FuzzyController),
    Pid(PidController),
}

impl Strategy {
    pub fn from_config(kind: StrategyKind, config: &ControllerConfig) -> Self {
        match kind {
            StrategyKind::Fuzzy => Self::Fuzzy(FuzzyController::from_config(config)),
            StrategyKind::Pid => Self::Pid(PidController::from_config(config)),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Fuzzy(_) => StrategyKind::Fuzzy,
            Self::Pid(_) => StrategyKind::Pid,
        }
    }
}

impl ControlStrategy for Strategy {
    fn command(&mut self, state: &mut ControlState) -> u16 {
        match self {
            Self::Fuzzy(f) => f.command(state),
            Self::Pid(p) => p.command(state),
        }
    }

    fn reset(&mut self) {
        match self {
            Self::Fuzzy(f) => f.reset(),
            Self::Pid(p) => p.reset(),
        }
    }
}

pub struct ControlLoop {
    strategy: Strategy,
    state: ControlState,
    pwm_period: u16,
    primed: bool,
}

impl ControlLoop {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            strategy: Strategy::from_config(config.strategy, config),
            state: ControlState::default(),
            pwm_period: config.pwm_period,
            primed: false,
        }
    }

    /// Run one iteration on a fresh speed estimate and return `N`.
    pub fn update(&mut self, measured: u16) -> u16 {
        // First sample has no history: treat the trend as steady.
        let previous = if self.primed {
            self.state.measured
        } else {
            measured
        };
        self.primed = true;

        let s = &mut self.state;
        s.previous = previous;
        s.measured = measured;
        s.error = i32::from(s.target) - i32::from(measured);
        s.derivative = i32::from(measured) - i32::from(previous);

        // Zero target is a hard stop for every law.
        if s.target == 0 {
            self.strategy.reset();
            s.command = 0;
            return 0;
        }

        let n = self.strategy.command(&mut self.state).min(self.pwm_period);
        self.state.command = n;
        n
    }

    pub fn set_target(&mut self, target: u16) {
        self.state.target = target;
    }

    /// Zero the target and the command; strategy history is dropped.
    pub fn stop(&mut self) {
        self.state.target = 0;
        self.state.command = 0;
        self.strategy.reset();
    }

    /// Switch control law.  The new strategy starts from a clean slate.
    pub fn select(&mut self, kind: StrategyKind, config: &ControllerConfig) {
        self.strategy = Strategy::from_config(kind, config);
        self.primed = false;
        self.state.error_degrees = ErrorMemberships::default();
        self.state.derivative_degrees = DerivativeMemberships::default();
    }

    /// Rebuild around new tuning, keeping the target and strategy kind.
    pub fn reconfigure(&mut self, config: &ControllerConfig) {
        let kind = self.strategy.kind();
        self.pwm_period = config.pwm_period;
        self.select(kind, config);
        self.state.command = self.state.command.min(self.pwm_period);
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn strategy_kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    pub fn pwm_period(&self) -> u16 {
        self.pwm_period
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pid_loop_from_standstill() {
        let mut cl = ControlLoop::new(&ControllerConfig::default());
        cl.set_target(2400);
        assert_eq!(cl.update(0), 2300);
        assert_eq!(cl.state().error, 2400);
        assert_eq!(cl.state().derivative, 0);
    }

    #[test]
    fn derivative_tracks_previous_measurement() {
        let mut cl = ControlLoop::new(&ControllerConfig::default());
        cl.set_target(1000);
        cl.update(100);
        cl.update(160);
        assert_eq!(cl.state().previous, 100);
        assert_eq!(cl.state().derivative, 60);
    }

    #[test]
    fn stop_zeroes_command_and_target() {
        let mut cl = ControlLoop::new(&ControllerConfig::default());
        cl.set_target(3000);
        cl.update(0);
        cl.stop();
        assert_eq!(cl.state().command, 0);
        assert_eq!(cl.update(0), 0);
    }

    #[test]
    fn fuzzy_zero_target_holds_zero_while_spinning_down() {
        let config = ControllerConfig {
            strategy: StrategyKind::Fuzzy,
            ..ControllerConfig::default()
        };
        let mut cl = ControlLoop::new(&config);
        cl.set_target(0);
        // Falling speed would otherwise read as "ok + decreasing".
        for m in [40, 20, 0] {
            assert_eq!(cl.update(m), 0);
        }
    }

    #[test]
    fn select_swaps_strategy() {
        let config = ControllerConfig::default();
        let mut cl = ControlLoop::new(&config);
        assert_eq!(cl.strategy_kind(), StrategyKind::Pid);
        cl.select(StrategyKind::Fuzzy, &config);
        assert_eq!(cl.strategy_kind(), StrategyKind::Fuzzy);
        cl.set_target(3000);
        // Fuzzy ramps from zero level: one step of TN out of 255.
        assert_eq!(cl.update(0), 20 * 2500 / 255);
    }

    #[test]
    fn reconfigure_shrinks_period() {
        let mut cl = ControlLoop::new(&ControllerConfig::default());
        cl.set_target(4000);
        assert_eq!(cl.update(0), 2500);
        cl.reconfigure(&ControllerConfig {
            pwm_period: 1000,
            ..ControllerConfig::default()
        });
        assert_eq!(cl.state().command, 1000);
        assert_eq!(cl.update(0), 1000);
    }
}
