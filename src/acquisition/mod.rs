//! Acquisition state machine.
//!
//! Orchestrates one conversion cycle (start → wait for ready → retrieve)
//! on top of any [`AdcWiring`].  The trigger strategy is fixed when the
//! machine is built:
//!
//! | Mode | Starts a conversion | Retrieves the data |
//! |---|---|---|
//! | `Polled` | [`Acquisition::sample`] | same call, bounded busy-wait |
//! | `TimerDriven` | [`Acquisition::on_timer_tick`] | [`Acquisition::on_ready_edge`] |
//! | `EdgeDriven` | [`Acquisition::arm`], then each ready edge | [`Acquisition::on_ready_edge`] |
//!
//! ```text
//!        start            ready edge           delivered
//! Idle ────────▶ Converting ────────▶ Ready ──────────────▶ Idle
//!                   │  timer tick while here: overrun, no restart
//! ```
//!
//! The interrupt handlers never block and never log; anything unusual is
//! counted in [`AcquisitionStats`] for the control task to report.  Wrap
//! the machine in an [`IsrCell`](isr_cell::IsrCell) so each handler body
//! runs with interrupts masked.

pub mod isr_cell;

use embedded_hal::delay::DelayNs;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::ControllerConfig;
use crate::drivers::adc::{AdcWiring, RawSample};
use crate::error::{AcquisitionError, Error, QueueError, Result};
use crate::sensors::tacho::to_millivolts;

pub use crate::drivers::adc::EdgePolarity;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerMode {
    /// Synchronous start/wait/read, for bring-up and diagnostics.
    Polled,
    /// Periodic timer starts conversions; the ready edge retrieves them.
    TimerDriven,
    /// The ready edge retrieves and immediately restarts.
    EdgeDriven,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionState {
    Idle,
    Converting,
    Ready,
}

/// Where finished conversions go, as signed millivolts.
pub trait SampleSink {
    fn deliver(&mut self, millivolts: i32) -> core::result::Result<(), QueueError>;
}

/// Counters maintained by the handlers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcquisitionStats {
    /// Samples read off the bus.
    pub conversions: u32,
    /// Polled waits that hit the timeout.
    pub timeouts: u32,
    /// Ready edges with no conversion in flight, or with BUSY still asserted.
    pub spurious_edges: u32,
    /// Timer ticks that arrived before the previous sample was retrieved.
    pub overruns: u32,
    /// Samples the sink refused.
    pub dropped: u32,
    /// Pin-level failures.
    pub bus_errors: u32,
}

/// Interrupts found pending at the same time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingIrqs {
    pub ready_edge: bool,
    pub timer_tick: bool,
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

pub struct Acquisition<A, S> {
    adc: A,
    sink: S,
    mode: TriggerMode,
    state: AcquisitionState,
    ticks_per_volt: i32,
    sample_bits: u8,
    timeout_us: u32,
    poll_interval_us: u32,
    stats: AcquisitionStats,
    last_sample: Option<RawSample>,
}

impl<A: AdcWiring, S: SampleSink> Acquisition<A, S> {
    pub fn new(adc: A, sink: S, config: &ControllerConfig) -> Self {
        Self {
            adc,
            sink,
            mode: config.trigger_mode,
            state: AcquisitionState::Idle,
            ticks_per_volt: config.ticks_per_volt,
            sample_bits: config.sample_bits,
            timeout_us: config.conversion_timeout_us,
            poll_interval_us: config.poll_interval_us.max(1),
            stats: AcquisitionStats::default(),
            last_sample: None,
        }
    }

    // ── Polled ────────────────────────────────────────────────

    /// Start a conversion, wait for it and return the sample.
    ///
    /// The wait is bounded by `conversion_timeout_us`; a chip that never
    /// releases BUSY yields [`AcquisitionError::ConversionTimeout`].
    /// The sample is returned to the caller, not delivered to the sink.
    pub fn sample(&mut self, delay: &mut impl DelayNs) -> Result<RawSample> {
        if self.mode != TriggerMode::Polled {
            return Err(Error::Config("polled sampling is disabled in interrupt modes"));
        }

        let result = self.sample_inner(delay);
        self.state = AcquisitionState::Idle;
        match result {
            Ok(raw) => {
                debug!("acq: polled sample 0x{:03X}", raw.code());
                Ok(raw)
            }
            Err(AcquisitionError::ConversionTimeout) => {
                self.stats.timeouts = self.stats.timeouts.wrapping_add(1);
                warn!(
                    "acq: BUSY still asserted after {} us (timeouts={})",
                    self.timeout_us, self.stats.timeouts
                );
                Err(AcquisitionError::ConversionTimeout.into())
            }
            Err(e) => {
                self.stats.bus_errors = self.stats.bus_errors.wrapping_add(1);
                Err(e.into())
            }
        }
    }

    fn sample_inner(
        &mut self,
        delay: &mut impl DelayNs,
    ) -> core::result::Result<RawSample, AcquisitionError> {
        self.adc.start_conversion()?;
        self.state = AcquisitionState::Converting;

        let mut waited_us = 0u32;
        while self.adc.is_busy()? {
            if waited_us >= self.timeout_us {
                return Err(AcquisitionError::ConversionTimeout);
            }
            delay.delay_us(self.poll_interval_us);
            waited_us = waited_us.saturating_add(self.poll_interval_us);
        }

        self.state = AcquisitionState::Ready;
        let raw = self.adc.read_sample()?.reduced(self.sample_bits);
        self.stats.conversions = self.stats.conversions.wrapping_add(1);
        self.last_sample = Some(raw);
        Ok(raw)
    }

    // ── Interrupt handlers ────────────────────────────────────

    /// Periodic timer handler: start a conversion unless one is in flight.
    pub fn on_timer_tick(&mut self) {
        if self.mode != TriggerMode::TimerDriven {
            return;
        }
        if self.state == AcquisitionState::Converting {
            // Never start over a sample that has not been read yet.
            self.stats.overruns = self.stats.overruns.wrapping_add(1);
            return;
        }
        self.begin_conversion();
    }

    /// Ready-line handler: retrieve the finished sample and deliver it.
    /// In edge-driven mode the next conversion starts right after.
    pub fn on_ready_edge(&mut self) {
        if self.mode == TriggerMode::Polled {
            return;
        }
        if self.state != AcquisitionState::Converting {
            self.stats.spurious_edges = self.stats.spurious_edges.wrapping_add(1);
            return;
        }
        match self.adc.is_busy() {
            Ok(false) => {}
            Ok(true) => {
                // Glitch on the ready line; the real edge is still coming.
                self.stats.spurious_edges = self.stats.spurious_edges.wrapping_add(1);
                return;
            }
            Err(_) => {
                // The conversion is abandoned; the cadence must go on.
                self.stats.bus_errors = self.stats.bus_errors.wrapping_add(1);
                self.state = AcquisitionState::Idle;
                if self.mode == TriggerMode::EdgeDriven {
                    self.begin_conversion();
                }
                return;
            }
        }

        self.state = AcquisitionState::Ready;
        self.retrieve();

        if self.mode == TriggerMode::EdgeDriven {
            self.begin_conversion();
        }
    }

    /// Dispatch simultaneously pending interrupts.  Retrieval always runs
    /// before the next start.
    pub fn pending(&mut self, pending: PendingIrqs) {
        if pending.ready_edge {
            self.on_ready_edge();
        }
        if pending.timer_tick {
            self.on_timer_tick();
        }
    }

    /// Kick off the first conversion of an edge-driven loop, or restart
    /// it after a pin failure left the machine idle.
    pub fn arm(&mut self) {
        if self.mode == TriggerMode::EdgeDriven && self.state == AcquisitionState::Idle {
            self.begin_conversion();
        }
    }

    fn begin_conversion(&mut self) {
        match self.adc.start_conversion() {
            Ok(()) => self.state = AcquisitionState::Converting,
            Err(_) => {
                self.stats.bus_errors = self.stats.bus_errors.wrapping_add(1);
                self.state = AcquisitionState::Idle;
            }
        }
    }

    fn retrieve(&mut self) {
        match self.adc.read_sample() {
            Ok(raw) => {
                let raw = raw.reduced(self.sample_bits);
                self.stats.conversions = self.stats.conversions.wrapping_add(1);
                self.last_sample = Some(raw);
                let millivolts = to_millivolts(raw.sign_extended(), self.ticks_per_volt);
                if self.sink.deliver(millivolts).is_err() {
                    self.stats.dropped = self.stats.dropped.wrapping_add(1);
                }
            }
            Err(_) => {
                self.stats.bus_errors = self.stats.bus_errors.wrapping_add(1);
            }
        }
        self.state = AcquisitionState::Idle;
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> AcquisitionState {
        self.state
    }

    pub fn mode(&self) -> TriggerMode {
        self.mode
    }

    pub fn stats(&self) -> AcquisitionStats {
        self.stats
    }

    pub fn last_sample(&self) -> Option<RawSample> {
        self.last_sample
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn adc_mut(&mut self) -> &mut A {
        &mut self.adc
    }
}
