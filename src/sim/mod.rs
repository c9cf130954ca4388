//! Host-side plant and peripheral models.
//!
//! Lets the full acquisition → averaging → control → actuator chain run
//! on a development machine against a simulated motor.
//!
//! ```text
//!   SimPwm + SimLine ──drive──▶ MotorPlant ──tach mV──▶ SimAdc
//!   (SetDutyCycle / OutputPin)                         (AdcWiring)
//! ```
//!
//! The models share one [`SharedPlant`]; everything is single-threaded.

pub mod adc_chip;

use core::cell::RefCell;
use core::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType as PinErrorType, OutputPin};
use embedded_hal::pwm::{ErrorType as PwmErrorType, SetDutyCycle};

use crate::drivers::adc::{AdcWiring, RawSample, SAMPLE_BITS};
use crate::error::AcquisitionError;

/// Tachometer full scale.
pub const FULL_SCALE_MV: i32 = 10_000;

// ── Plant ─────────────────────────────────────────────────────

/// First-order DC motor with a linear tachometer.
#[derive(Debug, Clone)]
pub struct MotorPlant {
    speed_rpm: f32,
    max_rpm: f32,
    time_constant_s: f32,
    millivolts_per_rpm: f32,
    /// Extra torque load as a fraction of full drive.
    load: f32,
    drive: f32,
    in1: bool,
    in2: bool,
    /// Latched once both inputs were ever high together.
    shorted: bool,
}

impl MotorPlant {
    pub fn new(max_rpm: f32, time_constant_s: f32, millivolts_per_rpm: f32) -> Self {
        Self {
            speed_rpm: 0.0,
            max_rpm,
            time_constant_s,
            millivolts_per_rpm,
            load: 0.0,
            drive: 0.0,
            in1: false,
            in2: false,
            shorted: false,
        }
    }

    /// Advance the model by `dt_s` seconds.
    pub fn step(&mut self, dt_s: f32) {
        let polarity = match (self.in1, self.in2) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            // Both low (coast) or both high (brake): no drive.
            _ => 0.0,
        };
        let effective = (self.drive - self.load).max(0.0);
        let steady = polarity * effective * self.max_rpm;
        let alpha = if self.time_constant_s > 0.0 {
            (dt_s / self.time_constant_s).min(1.0)
        } else {
            1.0
        };
        self.speed_rpm += (steady - self.speed_rpm) * alpha;
    }

    pub fn speed_rpm(&self) -> f32 {
        self.speed_rpm
    }

    /// Tachometer output, saturated at full scale.
    pub fn tach_millivolts(&self) -> i32 {
        let mv = (self.speed_rpm * self.millivolts_per_rpm) as i32;
        mv.clamp(-FULL_SCALE_MV, FULL_SCALE_MV)
    }

    pub fn drive(&self) -> f32 {
        self.drive
    }

    pub fn set_load(&mut self, load: f32) {
        self.load = load.clamp(0.0, 1.0);
    }

    /// Both bridge inputs have been high at the same time.
    pub fn shoot_through(&self) -> bool {
        self.shorted
    }
}

impl Default for MotorPlant {
    /// 4000 rpm at full drive, 0.3 s time constant, 10 V at 4200 rpm.
    fn default() -> Self {
        Self::new(4000.0, 0.3, 10_000.0 / 4200.0)
    }
}

pub type SharedPlant = Rc<RefCell<MotorPlant>>;

pub fn shared(plant: MotorPlant) -> SharedPlant {
    Rc::new(RefCell::new(plant))
}

// ── ADC ───────────────────────────────────────────────────────

/// Encode millivolts as a 12-bit two's-complement ADC code.
pub fn encode_millivolts(millivolts: i32, ticks_per_volt: i32) -> u16 {
    let ticks = (i64::from(millivolts) * i64::from(ticks_per_volt) / 1000).clamp(-2048, 2047);
    (ticks as u16) & 0x0FFF
}

/// ADC model sampling the plant's tachometer voltage.
///
/// The voltage is latched at conversion start, as a sample-and-hold
/// would.  A small deterministic dither keeps the average honest.
pub struct SimAdc {
    plant: SharedPlant,
    ticks_per_volt: i32,
    conversion_polls: u32,
    remaining: u32,
    latched: u16,
    dither: u32,
}

impl SimAdc {
    pub fn new(plant: SharedPlant, ticks_per_volt: i32) -> Self {
        Self {
            plant,
            ticks_per_volt,
            conversion_polls: 2,
            remaining: 0,
            latched: 0,
            dither: 0x1234_5678,
        }
    }

    /// Pretend the conversion finished (what the ready edge means).
    pub fn complete(&mut self) {
        self.remaining = 0;
    }

    fn next_dither_mv(&mut self) -> i32 {
        // Numerical Recipes LCG
        self.dither = self.dither.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        ((self.dither >> 28) as i32) - 8
    }
}

impl AdcWiring for SimAdc {
    fn start_conversion(&mut self) -> Result<(), AcquisitionError> {
        let dither = self.next_dither_mv();
        let mv = self.plant.borrow().tach_millivolts() + dither;
        self.latched = encode_millivolts(mv, self.ticks_per_volt);
        self.remaining = self.conversion_polls;
        Ok(())
    }

    fn is_busy(&mut self) -> Result<bool, AcquisitionError> {
        if self.remaining == 0 {
            return Ok(false);
        }
        self.remaining -= 1;
        Ok(true)
    }

    fn read_sample(&mut self) -> Result<RawSample, AcquisitionError> {
        Ok(RawSample::new(self.latched, SAMPLE_BITS))
    }
}

// ── Actuator ──────────────────────────────────────────────────

/// PWM channel driving the plant.
pub struct SimPwm {
    plant: SharedPlant,
    max_duty: u16,
}

impl SimPwm {
    pub fn new(plant: SharedPlant) -> Self {
        Self {
            plant,
            max_duty: 1000,
        }
    }
}

impl PwmErrorType for SimPwm {
    type Error = Infallible;
}

impl SetDutyCycle for SimPwm {
    fn max_duty_cycle(&self) -> u16 {
        self.max_duty
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
        self.plant.borrow_mut().drive = f32::from(duty.min(self.max_duty)) / f32::from(self.max_duty);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeInput {
    In1,
    In2,
}

/// One H-bridge direction input.
pub struct SimLine {
    plant: SharedPlant,
    input: BridgeInput,
}

impl SimLine {
    pub fn new(plant: SharedPlant, input: BridgeInput) -> Self {
        Self { plant, input }
    }

    fn set(&mut self, level: bool) {
        let mut p = self.plant.borrow_mut();
        match self.input {
            BridgeInput::In1 => p.in1 = level,
            BridgeInput::In2 => p.in2 = level,
        }
        p.shorted |= p.in1 && p.in2;
    }
}

impl PinErrorType for SimLine {
    type Error = Infallible;
}

impl OutputPin for SimLine {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.set(true);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::adc::sign_extend;
    use crate::sensors::tacho::{TICKS_PER_VOLT, to_millivolts};

    #[test]
    fn plant_settles_towards_drive() {
        let mut plant = MotorPlant::default();
        plant.in1 = true;
        plant.drive = 0.5;
        for _ in 0..500 {
            plant.step(0.01);
        }
        assert!((plant.speed_rpm() - 2000.0).abs() < 1.0);
    }

    #[test]
    fn coasting_plant_spins_down() {
        let mut plant = MotorPlant::default();
        plant.speed_rpm = 3000.0;
        plant.step(0.3);
        assert!(plant.speed_rpm() < 3000.0);
    }

    #[test]
    fn encode_is_inverse_of_decode_within_a_tick() {
        for mv in [-9990, -5000, -1, 0, 1, 4321, 9985] {
            let code = encode_millivolts(mv, TICKS_PER_VOLT);
            let back = to_millivolts(sign_extend(u32::from(code), 12), TICKS_PER_VOLT);
            assert!((back - mv).abs() <= 5, "{mv} -> {back}");
        }
    }

    #[test]
    fn encode_saturates_at_full_scale() {
        assert_eq!(encode_millivolts(20_000, TICKS_PER_VOLT), 0x7FF);
        assert_eq!(encode_millivolts(-20_000, TICKS_PER_VOLT), 0x800);
    }

    #[test]
    fn adc_latches_at_conversion_start() {
        let plant = shared(MotorPlant::default());
        plant.borrow_mut().speed_rpm = 2100.0;
        let mut adc = SimAdc::new(plant.clone(), TICKS_PER_VOLT);
        adc.start_conversion().unwrap();
        plant.borrow_mut().speed_rpm = 0.0;
        while adc.is_busy().unwrap() {}
        let mv = to_millivolts(adc.read_sample().unwrap().sign_extended(), TICKS_PER_VOLT);
        assert!((mv - 5000).abs() < 20, "{mv}");
    }

    #[test]
    fn momentary_overlap_is_remembered() {
        let plant = shared(MotorPlant::default());
        let mut in1 = SimLine::new(plant.clone(), BridgeInput::In1);
        let mut in2 = SimLine::new(plant.clone(), BridgeInput::In2);
        in1.set_high().unwrap();
        in2.set_high().unwrap();
        in1.set_low().unwrap();
        assert!(!plant.borrow().in1);
        assert!(plant.borrow().shoot_through());
    }

    #[test]
    fn clean_reversal_is_not_flagged() {
        let plant = shared(MotorPlant::default());
        let mut in1 = SimLine::new(plant.clone(), BridgeInput::In1);
        let mut in2 = SimLine::new(plant.clone(), BridgeInput::In2);
        in1.set_high().unwrap();
        in1.set_low().unwrap();
        in2.set_high().unwrap();
        assert!(!plant.borrow().shoot_through());
    }
}
