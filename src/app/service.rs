//! Control service: the hexagonal core of the controller.
//!
//! [`ControlService`] owns the configuration, the tachometer mapping and
//! the [`ControlLoop`].  Hardware and telemetry are injected at each call
//! site through port traits, so the whole service is testable with mocks.
//!
//! ```text
//!  averaged mV ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                  │      ControlService       │
//!  ActuatorPort ◀──│  Tachometer · ControlLoop │
//!                  └──────────────────────────┘
//! ```

use log::{info, warn};

use crate::config::ControllerConfig;
use crate::control::{ControlLoop, ControlState, StrategyKind};
use crate::error::{Error, Result};
use crate::sensors::Tachometer;

use super::commands::ControlCommand;
use super::events::{AppEvent, ControlTelemetry};
use super::ports::{ActuatorPort, EventSink};

pub struct ControlService {
    config: ControllerConfig,
    tacho: Tachometer,
    control: ControlLoop,
    millivolts: i32,
    iterations: u32,
    lost_seen: u32,
    actuator_faults: u32,
}

impl ControlService {
    /// Build the service.  The config must validate.
    pub fn new(config: ControllerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            tacho: Tachometer::from_config(&config),
            control: ControlLoop::new(&config),
            config,
            millivolts: 0,
            iterations: 0,
            lost_seen: 0,
            actuator_faults: 0,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Put the actuator in a known state: forward, zero duty.
    pub fn start(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) -> Result<()> {
        hw.set_direction(true)?;
        hw.set_duty_cycle(0, self.config.pwm_period)?;
        sink.emit(&AppEvent::Started {
            strategy: self.control.strategy_kind(),
            period: self.config.pwm_period,
        });
        info!(
            "ControlService started: strategy={:?} period={} window={}",
            self.control.strategy_kind(),
            self.config.pwm_period,
            self.config.window_size
        );
        Ok(())
    }

    // ── Per-window iteration ──────────────────────────────────

    /// One control iteration on a fresh window average.
    ///
    /// On an actuator failure the previous duty stays in place and the
    /// error is returned; the next iteration tries again.
    pub fn update(
        &mut self,
        millivolts: i32,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> Result<u16> {
        self.iterations = self.iterations.wrapping_add(1);
        self.millivolts = millivolts;

        let measured = self.tacho.rpm(millivolts);
        let n = self.control.update(measured);
        self.apply(n, hw)?;

        sink.emit(&AppEvent::Telemetry(self.telemetry()));
        Ok(n)
    }

    /// Report newly lost window averages, given the queue's running total.
    pub fn note_lost(&mut self, total: u32, sink: &mut impl EventSink) {
        let new = total.wrapping_sub(self.lost_seen);
        if new == 0 {
            return;
        }
        self.lost_seen = total;
        warn!("{} window averages lost (total {})", new, total);
        sink.emit(&AppEvent::SamplesLost { new, total });
    }

    // ── Command handling ──────────────────────────────────────

    pub fn handle_command(
        &mut self,
        cmd: ControlCommand,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        match cmd {
            ControlCommand::SetTarget(target) => {
                let from = self.control.state().target;
                if from != target {
                    self.control.set_target(target);
                    info!("Target {} -> {} rpm", from, target);
                    sink.emit(&AppEvent::TargetChanged { from, to: target });
                }
            }
            ControlCommand::SelectStrategy(kind) => {
                let from = self.control.strategy_kind();
                self.control.select(kind, &self.config);
                self.config.strategy = kind;
                info!("Strategy {:?} -> {:?}", from, kind);
                sink.emit(&AppEvent::StrategyChanged { from, to: kind });
            }
            ControlCommand::Stop => {
                let from = self.control.state().target;
                self.control.stop();
                self.apply(0, hw)?;
                info!("Stop requested");
                if from != 0 {
                    sink.emit(&AppEvent::TargetChanged { from, to: 0 });
                }
            }
            ControlCommand::UpdateConfig(config) => {
                if let Err(e) = config.validate() {
                    warn!("Rejected config update: {}", e);
                    return Err(e);
                }
                // The acquisition side is wired once at start-up.
                if !config.same_acquisition(&self.config) {
                    warn!("Rejected config update: acquisition fields changed");
                    return Err(Error::Config(
                        "acquisition settings cannot change at runtime",
                    ));
                }
                let strategy_changed = config.strategy != self.control.strategy_kind();
                let from = self.control.strategy_kind();
                self.tacho = Tachometer::from_config(&config);
                self.control.reconfigure(&config);
                if strategy_changed {
                    self.control.select(config.strategy, &config);
                    sink.emit(&AppEvent::StrategyChanged {
                        from,
                        to: config.strategy,
                    });
                }
                self.config = config;
                // A shorter period may have cut the live command.
                self.apply(self.control.state().command, hw)?;
                info!("Configuration updated at runtime");
            }
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn telemetry(&self) -> ControlTelemetry {
        let s = self.control.state();
        ControlTelemetry {
            target: s.target,
            measured: s.measured,
            millivolts: self.millivolts,
            error: s.error,
            derivative: s.derivative,
            command: s.command,
            period: self.control.pwm_period(),
            strategy: self.control.strategy_kind(),
            iterations: self.iterations,
        }
    }

    pub fn state(&self) -> &ControlState {
        self.control.state()
    }

    pub fn strategy(&self) -> StrategyKind {
        self.control.strategy_kind()
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Actuator writes that failed since startup.
    pub fn actuator_faults(&self) -> u32 {
        self.actuator_faults
    }

    // ── Internal ──────────────────────────────────────────────

    fn apply(&mut self, n: u16, hw: &mut impl ActuatorPort) -> Result<()> {
        hw.set_duty_cycle(n, self.control.pwm_period()).map_err(|e| {
            self.actuator_faults = self.actuator_faults.wrapping_add(1);
            warn!("Actuator write failed: {}", e);
            Error::from(e)
        })
    }
}
