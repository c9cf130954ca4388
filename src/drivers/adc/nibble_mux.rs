//! 8-bit wiring over a single 4-line bus, multiplexed by BYTE.
//!
//! BYTE low shows the high nibble, BYTE high the low nibble.  The two
//! are joined into a byte that becomes the MSBs of a 12-bit sample.

use embedded_hal::digital::{InputPin, OutputPin};

use super::{AdcWiring, ParallelBus, RawSample, ReadyLine, SAMPLE_BITS, pulse_convert, settle};
use crate::error::AcquisitionError;

pub struct NibbleMuxAdc<BUS, RC, BYTE, RDY> {
    bus: BUS,
    rc: RC,
    byte: BYTE,
    ready: ReadyLine<RDY>,
    settle_iterations: u32,
}

impl<BUS, RC, BYTE, RDY> NibbleMuxAdc<BUS, RC, BYTE, RDY>
where
    BUS: ParallelBus,
    RC: OutputPin,
    BYTE: OutputPin,
    RDY: InputPin,
{
    pub fn new(
        bus: BUS,
        mut rc: RC,
        mut byte: BYTE,
        ready: ReadyLine<RDY>,
        settle_iterations: u32,
    ) -> Result<Self, AcquisitionError> {
        debug_assert_eq!(BUS::WIDTH, 4, "nibble wiring needs a 4-line bus");
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

impl<BUS, RC, BYTE, RDY> AdcWiring for NibbleMuxAdc<BUS, RC, BYTE, RDY>
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
        let high_nibble = self.bus.read()? & 0x0F;

        self.byte
            .set_high()
            .map_err(|_| AcquisitionError::ControlLineFailed)?;
        settle(self.settle_iterations);
        let low_nibble = self.bus.read();
        self.byte
            .set_low()
            .map_err(|_| AcquisitionError::ControlLineFailed)?;
        let low_nibble = low_nibble? & 0x0F;

        let byte = (high_nibble << 4) | low_nibble;
        Ok(RawSample::new(u16::from(byte) << 4, SAMPLE_BITS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::adc_chip::{self, BusyPin, BytePin, RcPin};
    use crate::drivers::adc::{EdgePolarity, PinBus};

    #[test]
    fn joins_nibbles_into_sample_msbs() {
        let chip = adc_chip::chip(0xA5F);
        let mut adc = NibbleMuxAdc::new(
            PinBus::new(adc_chip::bus::<4>(&chip, adc_chip::nibble_view)),
            RcPin(chip.clone()),
            BytePin(chip.clone()),
            ReadyLine::new(BusyPin(chip.clone()), EdgePolarity::Rising),
            100,
        )
        .unwrap();

        adc.start_conversion().unwrap();
        while adc.is_busy().unwrap() {}
        let s = adc.read_sample().unwrap();

        // Low nibble of the chip's code is lost on this wiring.
        assert_eq!(s.code(), 0xA50);
        assert!(!chip.borrow().byte_high);
    }
}
