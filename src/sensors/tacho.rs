//! Tachometer signal conversion: ADC code → millivolts → RPM.
//!
//! The tachometer generator outputs a voltage proportional to shaft
//! speed, digitized at ±10 V full scale.  Below a dead-zone voltage the
//! generator output is dominated by brush noise and reads as standstill.

use crate::config::ControllerConfig;
use crate::drivers::adc::RawSample;

/// ADC ticks per volt for a 12-bit converter at ±10 V.
pub const TICKS_PER_VOLT: i32 = 205;

/// `(1000 * signed) / ticks_per_volt`, truncating toward zero.
///
/// A zero divisor yields 0 rather than trapping; validated configs never
/// carry one.
pub const fn to_millivolts(signed: i32, ticks_per_volt: i32) -> i32 {
    match (1000 * signed).checked_div(ticks_per_volt) {
        Some(mv) => mv,
        None => 0,
    }
}

/// Millivolt and RPM mapping for one tachometer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tachometer {
    ticks_per_volt: i32,
    dead_zone_mv: i32,
    scale_numerator: i32,
    scale_shift: u8,
    offset: i32,
}

impl Tachometer {
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self {
            ticks_per_volt: config.ticks_per_volt,
            dead_zone_mv: config.dead_zone_mv,
            scale_numerator: config.rpm_scale_numerator,
            scale_shift: config.rpm_scale_shift,
            offset: config.rpm_offset,
        }
    }

    pub fn millivolts(&self, raw: RawSample) -> i32 {
        to_millivolts(raw.sign_extended(), self.ticks_per_volt)
    }

    /// `((numerator * mv) >> shift) - offset`, zero inside the dead zone
    /// and never negative.
    pub fn rpm(&self, millivolts: i32) -> u16 {
        if millivolts < self.dead_zone_mv {
            return 0;
        }
        let scaled = (i64::from(self.scale_numerator) * i64::from(millivolts))
            >> u32::from(self.scale_shift);
        let rpm = scaled - i64::from(self.offset);
        rpm.clamp(0, i64::from(u16::MAX)) as u16
    }
}

impl Default for Tachometer {
    fn default() -> Self {
        Self::from_config(&ControllerConfig::default())
    }
}
