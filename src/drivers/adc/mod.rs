//! Bit-level driver for the external parallel ADC.
//!
//! The chip exposes an active-low BUSY line, an R/C (read/convert)
//! control line and a parallel data bus.  Three board wirings exist;
//! each is a concrete [`AdcWiring`] selected when the board is built:
//!
//! | Wiring | Data lines | BYTE select | Settling | Resolution |
//! |---|---|---|---|---|
//! | [`ByteSelectAdc`] | 8 | yes | yes | 12 bit |
//! | [`NibbleMuxAdc`] | 4 | yes | yes | 8 bit (as 12-bit MSBs) |
//! | [`DirectAdc`] | 4 + 4 | no | no | 8 bit (as 12-bit MSBs) |
//!
//! Drivers touch only their own pins and never log, so they may be
//! called from interrupt context.

pub mod byte_select;
pub mod direct;
pub mod nibble_mux;

pub use byte_select::ByteSelectAdc;
pub use direct::DirectAdc;
pub use nibble_mux::NibbleMuxAdc;

use embedded_hal::digital::{InputPin, OutputPin};
use serde::{Deserialize, Serialize};

use crate::config::ControllerConfig;
use crate::error::AcquisitionError;

/// Bits produced by every wiring.  8-bit wirings fill the MSBs.
pub const SAMPLE_BITS: u8 = 12;

// ---------------------------------------------------------------------------
// Raw sample
// ---------------------------------------------------------------------------

/// One conversion result, straight off the data bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    code: u16,
    bits: u8,
}

impl RawSample {
    /// Wrap `code`, keeping only the low `bits` bits.
    pub const fn new(code: u16, bits: u8) -> Self {
        Self {
            code: code & mask(bits),
            bits,
        }
    }

    pub const fn code(self) -> u16 {
        self.code
    }

    pub const fn bits(self) -> u8 {
        self.bits
    }

    /// Keep only the `bits` most significant bits; the rest read as zero.
    ///
    /// This is how an 8-bit board resolution shows up in a 12-bit word.
    #[must_use]
    pub const fn reduced(self, bits: u8) -> Self {
        if bits >= self.bits {
            return self;
        }
        let dropped = mask(self.bits - bits);
        Self {
            code: self.code & !dropped,
            bits: self.bits,
        }
    }

    /// Two's-complement interpretation over the sample width.
    pub const fn sign_extended(self) -> i32 {
        sign_extend(self.code as u32, self.bits)
    }
}

const fn mask(bits: u8) -> u16 {
    if bits >= 16 { u16::MAX } else { (1u16 << bits) - 1 }
}

/// Sign-extend the low `bits` bits of `raw`.
///
/// If bit `bits - 1` is set the result is `raw - 2^bits`, otherwise `raw`.
pub const fn sign_extend(raw: u32, bits: u8) -> i32 {
    let width = bits as u32;
    let raw = raw & ((1u32 << width) - 1);
    if raw & (1u32 << (width - 1)) != 0 {
        raw as i32 - (1i32 << width)
    } else {
        raw as i32
    }
}

// ---------------------------------------------------------------------------
// Capability set
// ---------------------------------------------------------------------------

/// The operations every ADC wiring supports.
pub trait AdcWiring {
    /// Pulse R/C to begin a conversion.
    fn start_conversion(&mut self) -> Result<(), AcquisitionError>;

    /// `true` while the chip is still converting.
    fn is_busy(&mut self) -> Result<bool, AcquisitionError>;

    /// Read the finished conversion off the data bus.
    fn read_sample(&mut self) -> Result<RawSample, AcquisitionError>;
}

// ---------------------------------------------------------------------------
// Data bus
// ---------------------------------------------------------------------------

/// A group of input lines sampled together.
pub trait ParallelBus {
    /// Number of lines.
    const WIDTH: u8;

    /// Sample every line; line 0 is the most significant bit.
    fn read(&mut self) -> Result<u8, AcquisitionError>;
}

/// A bus built from `N` individual GPIO inputs, MSB first.
pub struct PinBus<P, const N: usize> {
    pins: [P; N],
}

impl<P: InputPin, const N: usize> PinBus<P, N> {
    pub fn new(pins: [P; N]) -> Self {
        Self { pins }
    }
}

impl<P: InputPin, const N: usize> ParallelBus for PinBus<P, N> {
    const WIDTH: u8 = N as u8;

    fn read(&mut self) -> Result<u8, AcquisitionError> {
        let mut value = 0u8;
        for pin in &mut self.pins {
            let high = pin.is_high().map_err(|_| AcquisitionError::BusReadFailed)?;
            value = (value << 1) | u8::from(high);
        }
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// Control lines
// ---------------------------------------------------------------------------

/// Which ready-line transition marks end of conversion.
///
/// The chip's BUSY output goes high when done (`Rising`).  Boards that
/// route it through an inverter see the opposite edge (`Falling`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgePolarity {
    Rising,
    Falling,
}

impl EdgePolarity {
    /// Line level that means "conversion finished".
    pub const fn ready_level_high(self) -> bool {
        matches!(self, Self::Rising)
    }
}

/// The BUSY input, interpreted through the board's polarity.
pub struct ReadyLine<P> {
    pin: P,
    polarity: EdgePolarity,
}

impl<P: InputPin> ReadyLine<P> {
    pub fn new(pin: P, polarity: EdgePolarity) -> Self {
        Self { pin, polarity }
    }

    /// Use the board's configured `ready_edge`.
    pub fn from_config(pin: P, config: &ControllerConfig) -> Self {
        Self::new(pin, config.ready_edge)
    }

    pub fn is_busy(&mut self) -> Result<bool, AcquisitionError> {
        let high = self.pin.is_high().map_err(|_| AcquisitionError::BusReadFailed)?;
        Ok(high != self.polarity.ready_level_high())
    }

    pub fn polarity(&self) -> EdgePolarity {
        self.polarity
    }
}

/// Pulse R/C low then high; the falling edge starts a conversion.
pub(crate) fn pulse_convert<P: OutputPin>(rc: &mut P) -> Result<(), AcquisitionError> {
    rc.set_low().map_err(|_| AcquisitionError::ControlLineFailed)?;
    rc.set_high().map_err(|_| AcquisitionError::ControlLineFailed)
}

/// Busy-wait while the output bus settles after a BYTE change.
#[inline]
pub(crate) fn settle(iterations: u32) {
    for _ in 0..iterations {
        core::hint::spin_loop();
    }
}
