//! Outbound application events.
//!
//! The [`ControlService`](super::service::ControlService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide where they go.

use crate::control::StrategyKind;

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started.
    Started { strategy: StrategyKind, period: u16 },

    /// One control iteration finished.
    Telemetry(ControlTelemetry),

    StrategyChanged { from: StrategyKind, to: StrategyKind },

    TargetChanged { from: u16, to: u16 },

    /// Window averages were dropped because the queue was full.
    SamplesLost { new: u32, total: u32 },
}

/// Point-in-time view of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlTelemetry {
    pub target: u16,
    pub measured: u16,
    pub millivolts: i32,
    pub error: i32,
    pub derivative: i32,
    pub command: u16,
    pub period: u16,
    pub strategy: StrategyKind,
    pub iterations: u32,
}
