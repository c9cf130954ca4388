//! Controller configuration parameters
//!
//! All tunable parameters for the acquisition-to-actuation pipeline.
//! Values can be persisted as postcard bytes in non-volatile storage or
//! loaded from JSON on the host.

use log::info;
use serde::{Deserialize, Serialize};

use crate::acquisition::{EdgePolarity, TriggerMode};
use crate::control::StrategyKind;
use crate::control::fuzzy::LEVEL_MAX;
use crate::error::{Error, Result};

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    // --- Acquisition ---
    /// ADC ticks per volt of sensor input (±10 V full scale).
    pub ticks_per_volt: i32,
    /// Significant bits in a raw sample (8 or 12).
    pub sample_bits: u8,
    /// No-op iterations between a BYTE toggle and the second bus read.
    pub settle_iterations: u32,
    /// Upper bound on the polled busy-wait (microseconds).
    pub conversion_timeout_us: u32,
    /// Delay between busy-line polls (microseconds).
    pub poll_interval_us: u32,
    /// How conversions are started and completed.
    pub trigger_mode: TriggerMode,
    /// Edge of the ready line that signals completion.
    pub ready_edge: EdgePolarity,
    /// Timer period between conversion starts (microseconds).
    pub sample_period_us: u32,

    // --- Averaging ---
    /// Samples per published rolling average.
    pub window_size: u32,

    // --- Tachometer map ---
    /// Averages below this voltage read as a stopped motor (mV).
    pub dead_zone_mv: i32,
    /// Fixed-point scale numerator for mV -> RPM.
    pub rpm_scale_numerator: i32,
    /// Fixed-point scale shift for mV -> RPM.
    pub rpm_scale_shift: u8,
    /// RPM subtracted after scaling.
    pub rpm_offset: i32,

    // --- Actuator ---
    /// PWM period in duty units; the command is clamped to `[0, pwm_period]`.
    pub pwm_period: u16,

    // --- Control ---
    /// Which control law runs.
    pub strategy: StrategyKind,
    /// Fuzzy error threshold TE (RPM).
    pub fuzzy_error_threshold: i32,
    /// Fuzzy derivative threshold TD (RPM per iteration).
    pub fuzzy_derivative_threshold: i32,
    /// Fuzzy maximum step TN (command levels per iteration).
    pub fuzzy_step: i32,
    /// Proportional gain (duty units per RPM).
    pub kp: f32,
    /// Feed-forward offset (duty units).
    pub kf: f32,
    /// Integral gain. Zero keeps the law purely algebraic.
    pub ki: f32,
    /// Derivative gain.
    pub kd: f32,
    /// Control task period (milliseconds).
    pub control_period_ms: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            // Acquisition
            ticks_per_volt: 205, // 205 ticks = 1 V
            sample_bits: 12,
            settle_iterations: 100,
            conversion_timeout_us: 500,
            poll_interval_us: 1,
            trigger_mode: TriggerMode::TimerDriven,
            ready_edge: EdgePolarity::Rising,
            sample_period_us: 200, // 5 kHz

            // Averaging
            window_size: 100,

            // Tachometer: 10 V -> 4000 RPM
            dead_zone_mv: 500,
            rpm_scale_numerator: 27_526, // 0.42 in Q16, rounded up so 10 V reads 4000
            rpm_scale_shift: 16,
            rpm_offset: 200,

            // Actuator
            pwm_period: 2500,

            // Control
            strategy: StrategyKind::Pid,
            fuzzy_error_threshold: 80,
            fuzzy_derivative_threshold: 80,
            fuzzy_step: 20,
            kp: 0.75,
            kf: 500.0,
            ki: 0.0,
            kd: 0.0,
            control_period_ms: 20,
        }
    }
}

impl ControllerConfig {
    /// Reject out-of-range values.  Nothing is silently clamped.
    pub fn validate(&self) -> Result<()> {
        if self.ticks_per_volt <= 0 {
            return Err(Error::Config("ticks_per_volt must be positive"));
        }
        if !matches!(self.sample_bits, 8 | 12) {
            return Err(Error::Config("sample_bits must be 8 or 12"));
        }
        if self.conversion_timeout_us == 0 || self.poll_interval_us == 0 {
            return Err(Error::Config("conversion timeout and poll interval must be non-zero"));
        }
        if self.sample_period_us == 0 {
            return Err(Error::Config("sample_period_us must be non-zero"));
        }
        if self.window_size == 0 {
            return Err(Error::Config("window_size must be at least 1"));
        }
        if self.rpm_scale_shift >= 32 {
            return Err(Error::Config("rpm_scale_shift must be below 32"));
        }
        if self.pwm_period == 0 {
            return Err(Error::Config("pwm_period must be non-zero"));
        }
        if self.fuzzy_error_threshold <= 0 || self.fuzzy_derivative_threshold <= 0 {
            return Err(Error::Config("fuzzy thresholds must be positive"));
        }
        if !(0..=i32::from(LEVEL_MAX)).contains(&self.fuzzy_step) {
            return Err(Error::Config("fuzzy_step must be within 0..=255"));
        }
        if !(self.kp.is_finite() && self.kf.is_finite() && self.ki.is_finite() && self.kd.is_finite()) {
            return Err(Error::Config("PID gains must be finite"));
        }
        if self.kp < 0.0 || self.ki < 0.0 {
            return Err(Error::Config("kp and ki must not be negative"));
        }
        if self.control_period_ms == 0 {
            return Err(Error::Config("control_period_ms must be non-zero"));
        }
        Ok(())
    }

    /// True when `other` wires the acquisition side identically: same
    /// bus scaling, handshake timing, trigger and averaging window.
    pub fn same_acquisition(&self, other: &Self) -> bool {
        self.ticks_per_volt == other.ticks_per_volt
            && self.sample_bits == other.sample_bits
            && self.settle_iterations == other.settle_iterations
            && self.conversion_timeout_us == other.conversion_timeout_us
            && self.poll_interval_us == other.poll_interval_us
            && self.trigger_mode == other.trigger_mode
            && self.ready_edge == other.ready_edge
            && self.sample_period_us == other.sample_period_us
            && self.window_size == other.window_size
    }

    /// Time to fill one averaging window (microseconds).
    pub fn window_duration_us(&self) -> u64 {
        u64::from(self.window_size) * u64::from(self.sample_period_us)
    }

    /// Encode for non-volatile storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        postcard::to_allocvec(self).map_err(|_| Error::Config("encode failed"))
    }

    /// Decode from non-volatile storage and validate.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let config: Self =
            postcard::from_bytes(bytes).map_err(|_| Error::Config("stored config corrupted"))?;
        config.validate()?;
        info!("config: loaded {} bytes from storage", bytes.len());
        Ok(config)
    }
}
