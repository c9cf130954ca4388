//! Peripheral drivers: the parallel ADC and the H-bridge motor output.

pub mod adc;
pub mod motor;
