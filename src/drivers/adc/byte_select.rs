//! 12-bit wiring: eight data lines plus a BYTE select line.
//!
//! With BYTE low the bus carries the eight MSBs.  After BYTE goes high
//! and the outputs settle, the four LSBs appear on the upper half of the
//! bus.  BYTE is returned low afterwards so the next read starts from a
//! known state.

use embedded_hal::digital::{InputPin, OutputPin};

use super::{AdcWiring, ParallelBus, RawSample, ReadyLine, SAMPLE_BITS, pulse_convert, settle};
use crate::error::AcquisitionError;

pub struct ByteSelectAdc<BUS, RC, BYTE, RDY> {
    bus: BUS,
    rc: RC,
    byte: BYTE,
    ready: ReadyLine<RDY>,
    settle_iterations: u32,
}

impl<BUS, RC, BYTE, RDY> ByteSelectAdc<BUS, RC, BYTE, RDY>
where
    BUS: ParallelBus,
    RC: OutputPin,
    BYTE: OutputPin,
    RDY: InputPin,
{
    /// Take ownership of the lines and drive them to their idle levels
    /// (BYTE low, R/C high).
    pub fn new(
        bus: BUS,
        mut rc: RC,
        mut byte: BYTE,
        ready: ReadyLine<RDY>,
        settle_iterations: u32,
    ) -> Result<Self, AcquisitionError> {
        debug_assert_eq!(BUS::WIDTH, 8, "byte-select wiring needs an 8-line bus");
        byte.set_low().map_err(|_| AcquisitionError::ControlLineFailed)?;
        rc.set_high().map_err(|_| AcquisitionError::ControlLineFailed)?;
        Ok(Self {
            bus,
            rc,
            byte,
            ready,
            settle_iterations,
        })
    }
}

impl<BUS, RC, BYTE, RDY> AdcWiring for ByteSelectAdc<BUS, RC, BYTE, RDY>
where
    BUS: ParallelBus,
    RC: OutputPin,
    BYTE: OutputPin,
    RDY: InputPin,
{
    fn start_conversion(&mut self) -> Result<(), AcquisitionError> {
        pulse_convert(&mut self.rc)
    }

    fn is_busy(&mut self) -> Result<bool, AcquisitionError> {
        self.ready.is_busy()
    }

    fn read_sample(&mut self) -> Result<RawSample, AcquisitionError> {
        let high = self.bus.read()?;

        self.byte
            .set_high()
            .map_err(|_| AcquisitionError::ControlLineFailed)?;
        settle(self.settle_iterations);
        let low = self.bus.read();

        // Restore BYTE even if the second read failed.
        self.byte
            .set_low()
            .map_err(|_| AcquisitionError::ControlLineFailed)?;
        let low = low?;

        let code = (u16::from(high) << 4) | u16::from(low >> 4);
        Ok(RawSample::new(code, SAMPLE_BITS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::adc_chip::{self, BusyPin, BytePin, RcPin};
    use crate::drivers::adc::{EdgePolarity, PinBus};

    fn adc(
        chip: &adc_chip::Chip,
    ) -> ByteSelectAdc<PinBus<adc_chip::DataPin, 8>, RcPin, BytePin, BusyPin> {
        ByteSelectAdc::new(
            PinBus::new(adc_chip::bus::<8>(chip, adc_chip::byte_select_view)),
            RcPin(chip.clone()),
            BytePin(chip.clone()),
            ReadyLine::new(BusyPin(chip.clone()), EdgePolarity::Rising),
            100,
        )
        .unwrap()
    }

    #[test]
    fn reads_full_twelve_bits() {
        let chip = adc_chip::chip(0xABC);
        let mut adc = adc(&chip);
        adc.start_conversion().unwrap();
        while adc.is_busy().unwrap() {}
        let s = adc.read_sample().unwrap();
        assert_eq!(s.code(), 0xABC);
        assert_eq!(s.bits(), 12);
    }

    #[test]
    fn byte_line_is_restored_low() {
        let chip = adc_chip::chip(0x123);
        let mut adc = adc(&chip);
        adc.start_conversion().unwrap();
        while adc.is_busy().unwrap() {}
        adc.read_sample().unwrap();
        assert!(!chip.borrow().byte_high);
        assert!(chip.borrow().rc_high);
    }

    #[test]
    fn start_pulses_exactly_one_conversion() {
        let chip = adc_chip::chip(0);
        let mut adc = adc(&chip);
        adc.start_conversion().unwrap();
        assert_eq!(chip.borrow().conversions, 1);
        assert!(adc.is_busy().unwrap());
    }
}
