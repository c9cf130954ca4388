//! Pin-level model of the parallel tachometer ADC.
//!
//! One [`ChipState`] stands behind every pin the wiring drivers take:
//! data lines seen through a bus [`View`], R/C, BYTE and BUSY.  A
//! falling R/C edge starts a conversion that BUSY reports finished after
//! `conversion_polls` reads; [`ChipState::finish`] ends it at once, as
//! the ready interrupt would.

use core::cell::RefCell;
use core::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

#[derive(Debug, Default)]
pub struct ChipState {
    /// Analog input, already as a 12-bit code.
    pub input: u16,
    /// Latched conversion result.
    pub code: u16,
    pub byte_high: bool,
    pub rc_high: bool,
    pub converting: bool,
    /// BUSY polls left before the conversion completes.
    pub busy_polls: u32,
    /// Polls a conversion takes.
    pub conversion_polls: u32,
    pub conversions: u32,
    /// Never finish converting.
    pub stuck: bool,
}

impl ChipState {
    /// End the current conversion now and latch the input.
    pub fn finish(&mut self) {
        if self.converting {
            self.converting = false;
            self.code = self.input & 0x0FFF;
        }
    }

    /// Code the next conversion will produce.
    pub fn set_input(&mut self, code: u16) {
        self.input = code & 0x0FFF;
    }
}

pub type Chip = Rc<RefCell<ChipState>>;

pub fn chip(input: u16) -> Chip {
    Rc::new(RefCell::new(ChipState {
        input,
        rc_high: true,
        conversion_polls: 3,
        ..ChipState::default()
    }))
}

/// What the bus shows for a given chip state.
pub type View = fn(&ChipState) -> u8;

/// 8-line bus with BYTE select.
pub fn byte_select_view(s: &ChipState) -> u8 {
    if s.byte_high {
        ((s.code & 0x0F) << 4) as u8
    } else {
        (s.code >> 4) as u8
    }
}

/// 4-line bus with BYTE select carrying the top 8 bits.
pub fn nibble_view(s: &ChipState) -> u8 {
    let byte = (s.code >> 4) as u8;
    if s.byte_high { byte & 0x0F } else { byte >> 4 }
}

pub fn direct_high_view(s: &ChipState) -> u8 {
    ((s.code >> 8) & 0x0F) as u8
}

pub fn direct_low_view(s: &ChipState) -> u8 {
    ((s.code >> 4) & 0x0F) as u8
}

pub struct DataPin {
    chip: Chip,
    bit: u8,
    view: View,
}

/// Build the pins of a bus, MSB first.
pub fn bus<const N: usize>(chip: &Chip, view: View) -> [DataPin; N] {
    core::array::from_fn(|i| DataPin {
        chip: chip.clone(),
        bit: (N - 1 - i) as u8,
        view,
    })
}

impl ErrorType for DataPin {
    type Error = Infallible;
}

impl InputPin for DataPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        let s = self.chip.borrow();
        Ok(((self.view)(&s) >> self.bit) & 1 == 1)
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        self.is_high().map(|h| !h)
    }
}

pub struct RcPin(pub Chip);

impl ErrorType for RcPin {
    type Error = Infallible;
}

impl OutputPin for RcPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        let mut s = self.0.borrow_mut();
        if s.rc_high {
            s.converting = true;
            s.busy_polls = s.conversion_polls;
            s.conversions += 1;
        }
        s.rc_high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().rc_high = true;
        Ok(())
    }
}

pub struct BytePin(pub Chip);

impl ErrorType for BytePin {
    type Error = Infallible;
}

impl OutputPin for BytePin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().byte_high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().byte_high = true;
        Ok(())
    }
}

/// BUSY output: low while converting, high when done.
pub struct BusyPin(pub Chip);

impl ErrorType for BusyPin {
    type Error = Infallible;
}

impl InputPin for BusyPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        let mut s = self.0.borrow_mut();
        if s.converting && !s.stuck {
            if s.busy_polls == 0 {
                s.converting = false;
                s.code = s.input & 0x0FFF;
            } else {
                s.busy_polls -= 1;
            }
        }
        Ok(!s.converting)
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        self.is_high().map(|h| !h)
    }
}
