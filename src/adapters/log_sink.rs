//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing application events through the
//! `log` facade.  A display or serial-link adapter would implement the
//! same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
///
/// Telemetry is logged once every `telemetry_every` iterations so a
/// 50 Hz loop does not flood the console.
pub struct LogEventSink {
    telemetry_every: u32,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::with_decimation(1)
    }

    pub fn with_decimation(telemetry_every: u32) -> Self {
        Self {
            telemetry_every: telemetry_every.max(1),
        }
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                if t.iterations % self.telemetry_every != 0 {
                    return;
                }
                info!(
                    "TELEM | #{} | target={}rpm measured={}rpm ({}mV) | \
                     e={} de={} | N={}/{} | {:?}",
                    t.iterations,
                    t.target,
                    t.measured,
                    t.millivolts,
                    t.error,
                    t.derivative,
                    t.command,
                    t.period,
                    t.strategy,
                );
            }
            AppEvent::Started { strategy, period } => {
                info!("START | strategy={:?} period={}", strategy, period);
            }
            AppEvent::StrategyChanged { from, to } => {
                info!("STRAT | {:?} -> {:?}", from, to);
            }
            AppEvent::TargetChanged { from, to } => {
                info!("TARGET | {} -> {} rpm", from, to);
            }
            AppEvent::SamplesLost { new, total } => {
                warn!("LOST | {} window averages dropped (total {})", new, total);
            }
        }
    }
}
