//! Port traits: the boundary between the control core and the outside world.
//!
//! ```text
//!   ControlService ──▶ ActuatorPort ──▶ PWM + direction lines
//!                  └─▶ EventSink    ──▶ log / display / telemetry link
//! ```
//!
//! Adapters implement these; the service consumes them via generics, so
//! the core never touches hardware directly.

use crate::error::ActuatorError;

use super::events::AppEvent;

/// Write-side port for the motor.
///
/// Implementations do **no clamping**.  Callers guarantee
/// `n <= period`; a violation is reported as
/// [`ActuatorError::DutyOutOfRange`] and the output left unchanged.
pub trait ActuatorPort {
    /// Drive the motor at `n / period` of full power.
    fn set_duty_cycle(&mut self, n: u16, period: u16) -> Result<(), ActuatorError>;

    /// Select rotation direction.  The two bridge inputs are never
    /// asserted together.
    fn set_direction(&mut self, forward: bool) -> Result<(), ActuatorError>;
}

/// The core emits structured [`AppEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

/// Sink that discards everything.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &AppEvent) {}
}
