//! Mock hardware for integration tests.
//!
//! The library's pin-level ADC model wired as an 8-line byte-select
//! converter, and an actuator that records every call, so tests can
//! assert on the full command history without real GPIO/PWM.

use motorctl::app::events::AppEvent;
use motorctl::app::ports::{ActuatorPort, EventSink};
use motorctl::config::ControllerConfig;
use motorctl::drivers::adc::{ByteSelectAdc, PinBus, ReadyLine};
use motorctl::error::ActuatorError;
use motorctl::sim::adc_chip::{self, BusyPin, BytePin, Chip, DataPin, RcPin};

// ── ADC ───────────────────────────────────────────────────────

pub type MockAdc = ByteSelectAdc<PinBus<DataPin, 8>, RcPin, BytePin, BusyPin>;

pub fn byte_select_adc(chip: &Chip) -> MockAdc {
    let config = ControllerConfig::default();
    ByteSelectAdc::new(
        PinBus::new(adc_chip::bus::<8>(chip, adc_chip::byte_select_view)),
        RcPin(chip.clone()),
        BytePin(chip.clone()),
        ReadyLine::from_config(BusyPin(chip.clone()), &config),
        config.settle_iterations,
    )
    .expect("infallible pins")
}

// ── Actuator ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    Duty { n: u16, period: u16 },
    Direction { forward: bool },
}

#[derive(Default)]
pub struct MockActuator {
    pub calls: Vec<ActuatorCall>,
}

#[allow(dead_code)]
impl MockActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_duty(&self) -> Option<u16> {
        self.calls.iter().rev().find_map(|c| match c {
            ActuatorCall::Duty { n, .. } => Some(*n),
            ActuatorCall::Direction { .. } => None,
        })
    }
}

impl ActuatorPort for MockActuator {
    fn set_duty_cycle(&mut self, n: u16, period: u16) -> Result<(), ActuatorError> {
        if n > period {
            return Err(ActuatorError::DutyOutOfRange);
        }
        self.calls.push(ActuatorCall::Duty { n, period });
        Ok(())
    }

    fn set_direction(&mut self, forward: bool) -> Result<(), ActuatorError> {
        self.calls.push(ActuatorCall::Direction { forward });
        Ok(())
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
