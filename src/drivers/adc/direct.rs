//! 8-bit wiring: two 4-line ports read once, no BYTE line.
//!
//! Lower resolution than [`ByteSelectAdc`](super::ByteSelectAdc) but
//! needs no settling wait.  The byte becomes the MSBs of a 12-bit
//! sample; the four LSBs are zero.

use embedded_hal::digital::{InputPin, OutputPin};

use super::{AdcWiring, ParallelBus, RawSample, ReadyLine, SAMPLE_BITS, pulse_convert};
use crate::error::AcquisitionError;

pub struct DirectAdc<HI, LO, RC, RDY> {
    high_port: HI,
    low_port: LO,
    rc: RC,
    ready: ReadyLine<RDY>,
}

impl<HI, LO, RC, RDY> DirectAdc<HI, LO, RC, RDY>
where
    HI: ParallelBus,
    LO: ParallelBus,
    RC: OutputPin,
    RDY: InputPin,
{
    pub fn new(
        high_port: HI,
        low_port: LO,
        mut rc: RC,
        ready: ReadyLine<RDY>,
    ) -> Result<Self, AcquisitionError> {
        debug_assert_eq!(HI::WIDTH + LO::WIDTH, 8, "direct wiring needs 4 + 4 lines");
        rc.set_high().map_err(|_| AcquisitionError::ControlLineFailed)?;
        Ok(Self {
            high_port,
            low_port,
            rc,
            ready,
        })
    }
}

impl<HI, LO, RC, RDY> AdcWiring for DirectAdc<HI, LO, RC, RDY>
where
    HI: ParallelBus,
    LO: ParallelBus,
    RC: OutputPin,
    RDY: InputPin,
{
    fn start_conversion(&mut self) -> Result<(), AcquisitionError> {
        pulse_convert(&mut self.rc)
    }

    fn is_busy(&mut self) -> Result<bool, AcquisitionError> {
        self.ready.is_busy()
    }

    fn read_sample(&mut self) -> Result<RawSample, AcquisitionError> {
        let high = self.high_port.read()? & 0x0F;
        let low = self.low_port.read()? & 0x0F;
        let byte = (high << 4) | low;
        Ok(RawSample::new(u16::from(byte) << 4, SAMPLE_BITS))
    }
}
